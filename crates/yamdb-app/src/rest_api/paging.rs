use garde::Validate;
use serde::{Deserialize, Serialize};
use yamdb_dal::{Batch, ListingParams};

use crate::error::ApiResult;

mod parsers;

#[derive(Debug, Clone, Default, Validate, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct Paging {
    /// Page number, starting from 1
    #[garde(range(min = 1, max = 1_000_000))]
    page: Option<u32>,
    #[garde(range(min = 1, max = 1000))]
    page_size: Option<u32>,
    /// Comma separated fields, prefix `-` for descending order
    #[garde(length(max = 255))]
    sort: Option<String>,
    #[garde(length(max = 255))]
    search: Option<String>,
}

impl Paging {
    pub fn into_listing_params(self, default_page_size: u32) -> ApiResult<ListingParams> {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size(default_page_size);
        let offset = i64::from(page - 1) * i64::from(page_size);
        let mut params = ListingParams::new(offset, page_size.into());
        if let Some(sort) = self.sort.as_deref() {
            params = params.with_order(parsers::parse_ordering(sort)?);
        }
        if let Some(search) = self.search.as_deref().and_then(parsers::parse_search) {
            params = params.with_search(search);
        }
        Ok(params)
    }

    pub fn page_size(&self, default_page_size: u32) -> u32 {
        self.page_size.unwrap_or(default_page_size).max(1)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Page<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total: u64,
    pub rows: Vec<T>,
}

impl<T> Page<T>
where
    T: Serialize,
{
    pub fn from_batch(batch: Batch<T>, page_size: u32) -> Self {
        let page_size = page_size.max(1);
        let size = u64::from(page_size);
        let offset = u64::try_from(batch.offset).unwrap_or_default();
        let total_pages = batch.total.div_ceil(size);
        Self {
            page: u32::try_from(offset / size + 1).unwrap_or(u32::MAX),
            page_size,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
            total: batch.total,
            rows: batch.rows,
        }
    }
}

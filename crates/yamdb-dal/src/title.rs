use std::collections::HashMap;

use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, QueryBuilder, Row as _, SqliteConnection};
use tracing::debug;
use yamdb_types::general::validate_year;

use crate::{
    Batch, ChosenDB, ChosenRow, Error, ListingParams, category::Category, error::Result,
    genre::Genre,
};

const VALID_ORDER_FIELDS: &[&str] = &["id", "name", "year", "rating"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTitle {
    #[garde(length(min = 1, max = 256))]
    pub name: String,
    #[garde(custom(validate_year))]
    pub year: i32,
    #[garde(length(max = 5000))]
    pub description: Option<String>,
    /// Category slug
    #[garde(skip)]
    pub category: Option<String>,
    /// Genre slugs
    #[serde(default)]
    #[garde(skip)]
    pub genre: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTitle {
    #[garde(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[garde(inner(custom(validate_year)))]
    pub year: Option<i32>,
    #[garde(length(max = 5000))]
    pub description: Option<String>,
    #[garde(skip)]
    pub category: Option<String>,
    /// Replaces all genres of the title
    #[garde(skip)]
    pub genre: Option<Vec<String>>,
}

impl UpdateTitle {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.year.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.genre.is_none()
    }

    fn has_columns(&self) -> bool {
        self.name.is_some()
            || self.year.is_some()
            || self.description.is_some()
            || self.category.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Title {
    pub id: i64,
    pub name: String,
    pub year: i32,
    /// Average review score, absent when title has no reviews
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub genre: Vec<Genre>,
}

impl sqlx::FromRow<'_, ChosenRow> for Title {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let category = match row.try_get::<Option<i64>, _>("category_id")? {
            Some(id) => Some(Category {
                id,
                name: row.try_get("category_name")?,
                slug: row.try_get("category_slug")?,
            }),
            None => None,
        };
        Ok(Title {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            year: row.try_get("year")?,
            rating: row.try_get("rating")?,
            description: row.try_get("description")?,
            category,
            genre: Vec::new(),
        })
    }
}

/// Filters for title listing, all conditions must match
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct TitleFilter {
    /// Category slug
    #[garde(length(max = 50))]
    pub category: Option<String>,
    /// Genre slug
    #[garde(length(max = 50))]
    pub genre: Option<String>,
    /// Substring of title name
    #[garde(length(max = 256))]
    pub name: Option<String>,
    #[garde(skip)]
    pub year: Option<i32>,
}

const SELECT_TITLE: &str = r#"
    SELECT t.id AS id, t.name AS name, t.year AS year, t.description AS description,
    t.category_id AS category_id, c.name AS category_name, c.slug AS category_slug,
    (SELECT AVG(r.score) FROM review r WHERE r.title_id = t.id) AS rating
    FROM title t
    LEFT JOIN category c ON t.category_id = c.id
    "#;

fn push_name_match(query: &mut QueryBuilder<'_, ChosenDB>, text: &str) {
    query.push(" AND t.name LIKE ");
    query.push_bind(crate::contains_pattern(text));
    query.push(" ESCAPE '\\'");
}

/// Generic listing search matches title name, same as `name` filter
fn push_filters(
    query: &mut QueryBuilder<'_, ChosenDB>,
    filter: &TitleFilter,
    search: Option<&str>,
) {
    query.push(" WHERE 1 = 1");
    if let Some(category) = &filter.category {
        query.push(" AND c.slug = ");
        query.push_bind(category.clone());
    }
    if let Some(genre) = &filter.genre {
        query.push(
            " AND EXISTS (SELECT 1 FROM title_genre tg JOIN genre g ON tg.genre_id = g.id \
            WHERE tg.title_id = t.id AND g.slug = ",
        );
        query.push_bind(genre.clone());
        query.push(")");
    }
    if let Some(name) = &filter.name {
        push_name_match(query, name);
    }
    if let Some(search) = search {
        push_name_match(query, search);
    }
    if let Some(year) = filter.year {
        query.push(" AND t.year = ");
        query.push_bind(year);
    }
}

async fn load_genres(
    title_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<HashMap<i64, Vec<Genre>>> {
    let mut genres: HashMap<i64, Vec<Genre>> = HashMap::new();
    if title_ids.is_empty() {
        return Ok(genres);
    }
    let mut query = QueryBuilder::<ChosenDB>::new(
        "SELECT tg.title_id, g.id, g.name, g.slug FROM title_genre tg \
        JOIN genre g ON tg.genre_id = g.id WHERE tg.title_id IN (",
    );
    let mut ids = query.separated(", ");
    for id in title_ids {
        ids.push_bind(*id);
    }
    query.push(") ORDER BY g.name");
    let rows = query.build().fetch_all(&mut *conn).await?;
    for row in rows {
        let title_id: i64 = row.try_get("title_id")?;
        genres.entry(title_id).or_default().push(Genre {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
        });
    }
    Ok(genres)
}

async fn get(id: i64, conn: &mut SqliteConnection) -> Result<Title> {
    let mut title = sqlx::query_as::<_, Title>(&format!("{SELECT_TITLE} WHERE t.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::not_found("Title"))?;
    title.genre = load_genres(&[id], conn)
        .await?
        .remove(&id)
        .unwrap_or_default();
    Ok(title)
}

async fn category_id(slug: &str, conn: &mut SqliteConnection) -> Result<i64> {
    sqlx::query_scalar("SELECT id FROM category WHERE slug = ?")
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::InvalidReference(format!("Unknown category {slug}")))
}

async fn set_genres(title_id: i64, slugs: &[String], conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("DELETE FROM title_genre WHERE title_id = ?")
        .bind(title_id)
        .execute(&mut *conn)
        .await?;
    for slug in slugs {
        let genre_id: i64 = sqlx::query_scalar("SELECT id FROM genre WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| Error::InvalidReference(format!("Unknown genre {slug}")))?;
        sqlx::query("INSERT OR IGNORE INTO title_genre (title_id, genre_id) VALUES (?, ?)")
            .bind(title_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub type TitleRepository = TitleRepositoryImpl<sqlx::Pool<ChosenDB>>;

pub struct TitleRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> TitleRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateTitle) -> Result<Title> {
        let mut tx = self.executor.begin().await?;
        let category_id = match payload.category.as_deref() {
            Some(slug) => Some(category_id(slug, &mut *tx).await?),
            None => None,
        };
        let result = sqlx::query(
            "INSERT INTO title (name, year, description, category_id) VALUES (?, ?, ?, ?)",
        )
        .bind(&payload.name)
        .bind(payload.year)
        .bind(&payload.description)
        .bind(category_id)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();
        set_genres(id, &payload.genre, &mut *tx).await?;
        let title = get(id, &mut *tx).await?;
        tx.commit().await?;
        debug!("Created title {} with id {id}", title.name);
        Ok(title)
    }

    pub async fn update(&self, id: i64, payload: UpdateTitle) -> Result<Title> {
        let mut tx = self.executor.begin().await?;
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM title WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(Error::not_found("Title"));
        }

        if payload.has_columns() {
            let category_id = match payload.category.as_deref() {
                Some(slug) => Some(category_id(slug, &mut *tx).await?),
                None => None,
            };
            let mut query = QueryBuilder::<ChosenDB>::new("UPDATE title SET ");
            let mut fields = query.separated(", ");
            if let Some(name) = payload.name {
                fields.push("name = ");
                fields.push_bind_unseparated(name);
            }
            if let Some(year) = payload.year {
                fields.push("year = ");
                fields.push_bind_unseparated(year);
            }
            if let Some(description) = payload.description {
                fields.push("description = ");
                fields.push_bind_unseparated(description);
            }
            if let Some(category_id) = category_id {
                fields.push("category_id = ");
                fields.push_bind_unseparated(category_id);
            }
            query.push(" WHERE id = ");
            query.push_bind(id);
            query.build().execute(&mut *tx).await?;
        }

        if let Some(genre) = payload.genre {
            set_genres(id, &genre, &mut *tx).await?;
        }

        let title = get(id, &mut *tx).await?;
        tx.commit().await?;
        Ok(title)
    }

    pub async fn get(&self, id: i64) -> Result<Title> {
        let mut conn = self.executor.acquire().await?;
        get(id, &mut *conn).await
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM title WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.executor)
            .await?;
        Ok(found.is_some())
    }

    pub async fn list(&self, params: ListingParams, filter: TitleFilter) -> Result<Batch<Title>> {
        let order = params.ordering_or(VALID_ORDER_FIELDS, "id")?;
        let mut conn = self.executor.acquire().await?;

        let mut count_query = QueryBuilder::<ChosenDB>::new(
            "SELECT count(*) FROM title t LEFT JOIN category c ON t.category_id = c.id",
        );
        push_filters(&mut count_query, &filter, params.search.as_deref());
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *conn)
            .await?;

        let mut query = QueryBuilder::<ChosenDB>::new(SELECT_TITLE);
        push_filters(&mut query, &filter, params.search.as_deref());
        query.push(format!(" ORDER BY {order} LIMIT "));
        query.push_bind(params.limit);
        query.push(" OFFSET ");
        query.push_bind(params.offset);
        let mut titles = query
            .build_query_as::<Title>()
            .fetch_all(&mut *conn)
            .await?;

        let ids: Vec<i64> = titles.iter().map(|t| t.id).collect();
        let mut genres = load_genres(&ids, &mut *conn).await?;
        for title in titles.iter_mut() {
            title.genre = genres.remove(&title.id).unwrap_or_default();
        }
        Ok(Batch::new(&params, total, titles))
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM title WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        if res.rows_affected() == 0 {
            Err(Error::not_found("Title"))
        } else {
            Ok(())
        }
    }
}

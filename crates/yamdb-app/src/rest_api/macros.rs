/// Generates handlers, router and docs for catalog values addressed by slug.
///
/// Listing is public, creation and deletion require admin role.
#[macro_export]
macro_rules! slug_value_api {
    ($entity:ident) => {
        paste::paste! {
            use yamdb_dal::[<$entity:snake>]::{[<Create $entity>], $entity, [<$entity Repository>]};

            $crate::repository_from_request!([<$entity Repository>]);

            pub mod value_api {
                use super::*;
                use $crate::error::ApiResult;
                use $crate::rest_api::{Page, Paging};
                use $crate::state::AppState;
                use $crate::validate::Garde;
                use axum::{
                    extract::{Path, Query, State},
                    response::IntoResponse,
                    Json,
                };
                use http::StatusCode;

                #[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = stringify!($entity),
                    operation_id = concat!("list", stringify!($entity)), params(Paging),
                    responses((status = StatusCode::OK, description = "List paginated", body = Page<$entity>))))]
                pub async fn list(
                    repository: [<$entity Repository>],
                    State(state): State<AppState>,
                    Garde(Query(paging)): Garde<Query<Paging>>,
                ) -> ApiResult<impl IntoResponse> {
                    let default_page_size = state.config().default_page_size;
                    let page_size = paging.page_size(default_page_size);
                    let listing_params = paging.into_listing_params(default_page_size)?;
                    let batch = repository.list(listing_params).await?;
                    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
                }

                #[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = stringify!($entity),
                    operation_id = concat!("create", stringify!($entity)),
                    responses((status = StatusCode::CREATED, description = concat!("Created ", stringify!($entity)), body = $entity))))]
                pub async fn create(
                    repository: [<$entity Repository>],
                    Garde(Json(payload)): Garde<Json<[<Create $entity>]>>,
                ) -> ApiResult<impl IntoResponse> {
                    let record = repository.create(payload).await?;
                    Ok((StatusCode::CREATED, Json(record)))
                }

                #[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{slug}", tag = stringify!($entity),
                    operation_id = concat!("delete", stringify!($entity)),
                    responses((status = StatusCode::NO_CONTENT, description = "Deleted"))))]
                pub async fn delete(
                    Path(slug): Path<String>,
                    repository: [<$entity Repository>],
                ) -> ApiResult<impl IntoResponse> {
                    repository.delete_by_slug(&slug).await?;
                    Ok(StatusCode::NO_CONTENT)
                }

                #[cfg(feature = "openapi")]
                #[derive(utoipa::OpenApi)]
                #[openapi(paths(list, create, delete))]
                struct ApiDocs;

                #[cfg(feature = "openapi")]
                pub fn api_docs() -> utoipa::openapi::OpenApi {
                    use utoipa::OpenApi as _;
                    ApiDocs::openapi()
                }
            }

            #[cfg(feature = "openapi")]
            pub use value_api::api_docs;

            pub fn router() -> axum::Router<$crate::state::AppState> {
                use $crate::auth::token::RequiredRolesLayer;
                use axum::routing::{delete, get, post};
                use yamdb_types::claim::Role;
                axum::Router::new()
                    .route("/", post(value_api::create))
                    .route("/{slug}", delete(value_api::delete))
                    .layer(RequiredRolesLayer::new([Role::Admin]))
                    .route("/", get(value_api::list))
            }
        }
    };
}

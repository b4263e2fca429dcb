use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json,
};
use http::StatusCode;
use yamdb_dal::title::{CreateTitle, Title, TitleFilter, TitleRepository, UpdateTitle};
use yamdb_types::claim::Role;

use crate::{
    auth::token::RequiredRolesLayer,
    error::{ApiError, ApiResult},
    repository_from_request,
    rest_api::{Page, Paging},
    state::AppState,
    validate::Garde,
};

repository_from_request!(TitleRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list, get_title, create, update, delete))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Title", operation_id = "listTitle",
    params(Paging, TitleFilter),
    responses((status = StatusCode::OK, description = "List paginated", body = Page<Title>))))]
pub async fn list(
    repository: TitleRepository,
    State(state): State<AppState>,
    Garde(Query(paging)): Garde<Query<Paging>>,
    Garde(Query(filter)): Garde<Query<TitleFilter>>,
) -> ApiResult<impl IntoResponse> {
    let default_page_size = state.config().default_page_size;
    let page_size = paging.page_size(default_page_size);
    let listing_params = paging.into_listing_params(default_page_size)?;
    let batch = repository.list(listing_params, filter).await?;
    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{title_id}", tag = "Title", operation_id = "getTitle",
    responses((status = StatusCode::OK, description = "Get one", body = Title))))]
pub async fn get_title(
    Path(id): Path<i64>,
    repository: TitleRepository,
) -> ApiResult<impl IntoResponse> {
    let record = repository.get(id).await?;
    Ok((StatusCode::OK, Json(record)))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Title", operation_id = "createTitle",
    responses((status = StatusCode::CREATED, description = "Created Title", body = Title))))]
pub async fn create(
    repository: TitleRepository,
    Garde(Json(payload)): Garde<Json<CreateTitle>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.create(payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg_attr(feature = "openapi", utoipa::path(patch, path = "/{title_id}", tag = "Title", operation_id = "updateTitle",
    responses((status = StatusCode::OK, description = "Updated Title", body = Title))))]
pub async fn update(
    Path(id): Path<i64>,
    repository: TitleRepository,
    Garde(Json(payload)): Garde<Json<UpdateTitle>>,
) -> ApiResult<impl IntoResponse> {
    if payload.is_empty() {
        return Err(ApiError::invalid_input("No fields to update"));
    }
    let record = repository.update(id, payload).await?;
    Ok((StatusCode::OK, Json(record)))
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{title_id}", tag = "Title", operation_id = "deleteTitle",
    responses((status = StatusCode::NO_CONTENT, description = "Deleted with its reviews"))))]
pub async fn delete(Path(id): Path<i64>, repository: TitleRepository) -> ApiResult<impl IntoResponse> {
    repository.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(create))
        .route("/{title_id}", axum::routing::patch(update).delete(delete))
        .layer(RequiredRolesLayer::new([Role::Admin]))
        .route("/", get(list))
        .route("/{title_id}", get(get_title))
        .nest("/{title_id}/reviews", super::review::router())
}

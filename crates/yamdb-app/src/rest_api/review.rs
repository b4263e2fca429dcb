use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use http::StatusCode;
use tracing::debug;
use yamdb_dal::{
    review::{CreateReview, Review, ReviewRepository, UpdateReview},
    title::TitleRepository,
};

use crate::{
    access::ensure_can_modify,
    auth::token::CurrentUser,
    error::{ApiError, ApiResult},
    rest_api::{Page, Paging},
    state::AppState,
    validate::Garde,
};

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list, get_review, create, update, delete))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

/// Repository of reviews for existing title, 404 if title does not exist
pub(super) async fn reviews_of(state: &AppState, title_id: i64) -> ApiResult<ReviewRepository> {
    if !TitleRepository::new(state.pool().clone())
        .exists(title_id)
        .await?
    {
        return Err(ApiError::NotFound("Title not found".to_string()));
    }
    Ok(ReviewRepository::new(state.pool().clone(), title_id))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Review", operation_id = "listReview",
    params(Paging),
    responses((status = StatusCode::OK, description = "List paginated", body = Page<Review>))))]
pub async fn list(
    Path(title_id): Path<i64>,
    State(state): State<AppState>,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    let repository = reviews_of(&state, title_id).await?;
    let default_page_size = state.config().default_page_size;
    let page_size = paging.page_size(default_page_size);
    let batch = repository
        .list(paging.into_listing_params(default_page_size)?)
        .await?;
    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{review_id}", tag = "Review", operation_id = "getReview",
    responses((status = StatusCode::OK, description = "Get one", body = Review))))]
pub async fn get_review(
    Path((title_id, id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let review = reviews_of(&state, title_id).await?.get(id).await?;
    Ok((StatusCode::OK, Json(review)))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Review", operation_id = "createReview",
    responses((status = StatusCode::CREATED, description = "Created Review", body = Review))))]
pub async fn create(
    Path(title_id): Path<i64>,
    State(state): State<AppState>,
    user: CurrentUser,
    Garde(Json(payload)): Garde<Json<CreateReview>>,
) -> ApiResult<impl IntoResponse> {
    let repository = reviews_of(&state, title_id).await?;
    if repository.exists_for_author(user.id).await? {
        debug!("User {} already reviewed title {title_id}", user.username);
        return Err(ApiError::Conflict(
            "You have already reviewed this title".to_string(),
        ));
    }
    let review = repository.create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[cfg_attr(feature = "openapi", utoipa::path(patch, path = "/{review_id}", tag = "Review", operation_id = "updateReview",
    responses((status = StatusCode::OK, description = "Updated Review", body = Review))))]
pub async fn update(
    Path((title_id, id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    user: CurrentUser,
    Garde(Json(payload)): Garde<Json<UpdateReview>>,
) -> ApiResult<impl IntoResponse> {
    let repository = reviews_of(&state, title_id).await?;
    let review = repository.get(id).await?;
    ensure_can_modify(&user, &review)?;
    if payload.is_empty() {
        return Err(ApiError::invalid_input("No fields to update"));
    }
    let review = repository.update(id, payload).await?;
    Ok((StatusCode::OK, Json(review)))
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{review_id}", tag = "Review", operation_id = "deleteReview",
    responses((status = StatusCode::NO_CONTENT, description = "Deleted with its comments"))))]
pub async fn delete(
    Path((title_id, id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let repository = reviews_of(&state, title_id).await?;
    let review = repository.get(id).await?;
    ensure_can_modify(&user, &review)?;
    repository.delete(id).await?;
    debug!("Review {id} deleted by {}", user.username);
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route(
            "/{review_id}",
            get(get_review).patch(update).delete(delete),
        )
        .nest("/{review_id}/comments", super::comment::router())
}

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use http::StatusCode;
use tracing::debug;
use yamdb_dal::comment::{Comment, CommentRepository, CreateComment, UpdateComment};

use crate::{
    access::ensure_can_modify,
    auth::token::CurrentUser,
    error::{ApiError, ApiResult},
    rest_api::{review::reviews_of, Page, Paging},
    state::AppState,
    validate::Garde,
};

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list, get_comment, create, update, delete))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

/// Both title and review within that title must exist
async fn comments_of(
    state: &AppState,
    title_id: i64,
    review_id: i64,
) -> ApiResult<CommentRepository> {
    reviews_of(state, title_id).await?.get(review_id).await?;
    Ok(CommentRepository::new(state.pool().clone(), review_id))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Comment", operation_id = "listComment",
    params(Paging),
    responses((status = StatusCode::OK, description = "List paginated", body = Page<Comment>))))]
pub async fn list(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    let repository = comments_of(&state, title_id, review_id).await?;
    let default_page_size = state.config().default_page_size;
    let page_size = paging.page_size(default_page_size);
    let batch = repository
        .list(paging.into_listing_params(default_page_size)?)
        .await?;
    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{comment_id}", tag = "Comment", operation_id = "getComment",
    responses((status = StatusCode::OK, description = "Get one", body = Comment))))]
pub async fn get_comment(
    Path((title_id, review_id, id)): Path<(i64, i64, i64)>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let comment = comments_of(&state, title_id, review_id)
        .await?
        .get(id)
        .await?;
    Ok((StatusCode::OK, Json(comment)))
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Comment", operation_id = "createComment",
    responses((status = StatusCode::CREATED, description = "Created Comment", body = Comment))))]
pub async fn create(
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    user: CurrentUser,
    Garde(Json(payload)): Garde<Json<CreateComment>>,
) -> ApiResult<impl IntoResponse> {
    let comment = comments_of(&state, title_id, review_id)
        .await?
        .create(user.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[cfg_attr(feature = "openapi", utoipa::path(patch, path = "/{comment_id}", tag = "Comment", operation_id = "updateComment",
    responses((status = StatusCode::OK, description = "Updated Comment", body = Comment))))]
pub async fn update(
    Path((title_id, review_id, id)): Path<(i64, i64, i64)>,
    State(state): State<AppState>,
    user: CurrentUser,
    Garde(Json(payload)): Garde<Json<UpdateComment>>,
) -> ApiResult<impl IntoResponse> {
    let repository = comments_of(&state, title_id, review_id).await?;
    let comment = repository.get(id).await?;
    ensure_can_modify(&user, &comment)?;
    if payload.is_empty() {
        return Err(ApiError::invalid_input("No fields to update"));
    }
    let comment = repository.update(id, payload).await?;
    Ok((StatusCode::OK, Json(comment)))
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{comment_id}", tag = "Comment", operation_id = "deleteComment",
    responses((status = StatusCode::NO_CONTENT, description = "Deleted"))))]
pub async fn delete(
    Path((title_id, review_id, id)): Path<(i64, i64, i64)>,
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let repository = comments_of(&state, title_id, review_id).await?;
    let comment = repository.get(id).await?;
    ensure_can_modify(&user, &comment)?;
    repository.delete(id).await?;
    debug!("Comment {id} deleted by {}", user.username);
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list).post(create))
        .route(
            "/{comment_id}",
            get(get_comment).patch(update).delete(delete),
        )
}

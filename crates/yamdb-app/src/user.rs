use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use http::StatusCode;
use tracing::{debug, info};
use yamdb_dal::user::{CreateUser, UpdateUser, User, UserRepository};
use yamdb_types::claim::{Authorization as _, Role};

use crate::{
    auth::token::{CurrentUser, RequiredRolesLayer},
    error::{ApiError, ApiResult},
    repository_from_request,
    rest_api::{Page, Paging},
    state::AppState,
    validate::Garde,
};

repository_from_request!(UserRepository);

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(list_users, create_user, get_user, update_user, delete_user, get_me, update_me))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

fn ensure_not_empty(payload: &UpdateUser) -> ApiResult<()> {
    if payload.is_empty() {
        Err(ApiError::invalid_input("No fields to update"))
    } else {
        Ok(())
    }
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Users", operation_id = "listUsers",
    params(Paging),
    responses((status = StatusCode::OK, description = "List paginated, search by username", body = Page<User>))))]
async fn list_users(
    user_registry: UserRepository,
    State(state): State<AppState>,
    Garde(Query(paging)): Garde<Query<Paging>>,
) -> ApiResult<impl IntoResponse> {
    let default_page_size = state.config().default_page_size;
    let page_size = paging.page_size(default_page_size);
    let batch = user_registry
        .list(paging.into_listing_params(default_page_size)?)
        .await?;
    Ok((StatusCode::OK, Json(Page::from_batch(batch, page_size))))
}

/// Account is created with confirmation code, user obtains it by signup with same username and email
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Users", operation_id = "createUser",
    responses((status = StatusCode::CREATED, description = "Create new User", body = User))))]
pub async fn create_user(
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<CreateUser>>,
) -> ApiResult<impl IntoResponse> {
    let (user, _code) = user_registry.create(payload).await?;
    info!("User {} created by administrator", user.username);
    Ok((StatusCode::CREATED, Json(user)))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{username}", tag = "Users", operation_id = "getUser",
    responses((status = StatusCode::OK, description = "Get one", body = User))))]
async fn get_user(
    Path(username): Path<String>,
    user_registry: UserRepository,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.find_by_username(&username).await?;
    Ok((StatusCode::OK, Json(user)))
}

#[cfg_attr(feature = "openapi", utoipa::path(patch, path = "/{username}", tag = "Users", operation_id = "updateUser",
    responses((status = StatusCode::OK, description = "Updated User", body = User))))]
async fn update_user(
    Path(username): Path<String>,
    user_registry: UserRepository,
    Garde(Json(payload)): Garde<Json<UpdateUser>>,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.find_by_username(&username).await?;
    ensure_not_empty(&payload)?;
    let user = user_registry.update(user.id, payload).await?;
    Ok((StatusCode::OK, Json(user)))
}

#[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{username}", tag = "Users", operation_id = "deleteUser",
    responses((status = StatusCode::NO_CONTENT, description = "Deleted with reviews and comments"))))]
async fn delete_user(
    Path(username): Path<String>,
    user_registry: UserRepository,
) -> ApiResult<impl IntoResponse> {
    let user = user_registry.find_by_username(&username).await?;
    user_registry.delete(user.id).await?;
    debug!("Deleted user {username}");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/me", tag = "Users", operation_id = "getMe",
    responses((status = StatusCode::OK, description = "Own profile", body = User))))]
async fn get_me(current: CurrentUser, user_registry: UserRepository) -> ApiResult<impl IntoResponse> {
    let user = user_registry.get(current.id).await?;
    Ok((StatusCode::OK, Json(user)))
}

/// Own profile update, role can be changed only by admin
#[cfg_attr(feature = "openapi", utoipa::path(patch, path = "/me", tag = "Users", operation_id = "updateMe",
    responses((status = StatusCode::OK, description = "Updated own profile", body = User))))]
async fn update_me(
    current: CurrentUser,
    user_registry: UserRepository,
    Garde(Json(mut payload)): Garde<Json<UpdateUser>>,
) -> ApiResult<impl IntoResponse> {
    ensure_not_empty(&payload)?;
    if !current.is_admin() && payload.role.take().is_some() {
        debug!("Ignoring role change requested by {}", current.username);
    }
    let user = user_registry.update(current.id, payload).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub fn users_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{username}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .layer(RequiredRolesLayer::new([Role::Admin]).with_staff())
        .route("/me", get(get_me).patch(update_me))
}

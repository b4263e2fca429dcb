use axum::{extract::State, response::IntoResponse, routing::post, Json};
use garde::Validate;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use yamdb_dal::user::{CreateUser, User, UserRepository};
use yamdb_types::{
    claim::ApiClaim,
    general::{ValidEmail, ValidUsername},
};

use crate::{
    error::{ApiError, ApiResult},
    mail::Message,
    state::AppState,
    validate::Garde,
};

pub mod token;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SignupRequest {
    #[garde(dive)]
    pub username: ValidUsername,
    #[garde(dive)]
    pub email: ValidEmail,
}

pub type SignupResponse = SignupRequest;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenRequest {
    #[garde(length(min = 1, max = 150))]
    pub username: String,
    #[garde(length(min = 1, max = 64))]
    pub confirmation_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenResponse {
    pub token: String,
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(signup, token))]
struct ModuleDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ModuleDocs::openapi()
}

async fn find_user(
    lookup: impl std::future::Future<Output = yamdb_dal::error::Result<User>>,
) -> ApiResult<Option<User>> {
    match lookup.await {
        Ok(user) => Ok(Some(user)),
        Err(yamdb_dal::Error::RecordNotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Registers new account or issues fresh code for existing one, code is mailed to user
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/signup", tag = "Auth", operation_id = "signup",
    responses((status = StatusCode::OK, description = "Confirmation code sent", body = SignupResponse))))]
pub async fn signup(
    State(state): State<AppState>,
    Garde(Json(payload)): Garde<Json<SignupRequest>>,
) -> ApiResult<impl IntoResponse> {
    let users = UserRepository::new(state.pool().clone());
    let by_name = find_user(users.find_by_username(payload.username.as_ref())).await?;
    let by_email = find_user(users.find_by_email(payload.email.as_ref())).await?;

    let (user, code) = match (by_name, by_email) {
        (Some(named), Some(mailed)) if named.id == mailed.id => {
            debug!("Issuing new confirmation code for {}", named.username);
            let code = users.issue_code(named.id).await?;
            (named, code)
        }
        (None, None) => {
            let (user, code) = users
                .create(CreateUser::new(
                    payload.username.clone(),
                    payload.email.clone(),
                ))
                .await?;
            info!("New user {} signed up", user.username);
            (user, code)
        }
        (Some(_), _) => {
            return Err(ApiError::invalid_field(
                "username",
                "User with this username already exists",
            ))
        }
        (None, Some(_)) => {
            return Err(ApiError::invalid_field(
                "email",
                "User with this email already exists",
            ))
        }
    };

    let config = state.config();
    let message = Message::confirmation_code(&config.mail_from, &user.username, &user.email, &code);
    state.mailer().send(&message).await.map_err(|e| {
        error!("Cannot deliver confirmation code to {}: {e}", user.email);
        ApiError::Internal(format!("Mail delivery failed: {e}"))
    })?;

    Ok((StatusCode::OK, Json(payload)))
}

/// Exchanges confirmation code for bearer token
#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/token", tag = "Auth", operation_id = "token",
    responses((status = StatusCode::CREATED, description = "Bearer token", body = TokenResponse))))]
pub async fn token(
    State(state): State<AppState>,
    Garde(Json(payload)): Garde<Json<TokenRequest>>,
) -> ApiResult<impl IntoResponse> {
    let user = UserRepository::new(state.pool().clone())
        .check_code(&payload.username, &payload.confirmation_code)
        .await?;
    let claim = ApiClaim::new_expired(user.id, user.username, user.role);
    let token = state.tokens().issue(claim)?;
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// Builds authentication router, which should be nested on /auth path
pub fn auth_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/signup", post(signup))
        .route("/token", post(token))
}

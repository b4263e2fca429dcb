use std::{
    convert::Infallible,
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use headers::{authorization::Bearer, Authorization as AuthorizationHeader, HeaderMapExt as _};
use http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use tower::{Layer, Service};
use tracing::{debug, warn};
use yamdb_dal::user::{User, UserRepository};
use yamdb_types::claim::{ApiClaim, Authorization, Role};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Authenticated account, resolved from bearer token on each request
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub is_staff: bool,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        CurrentUser {
            id: user.id,
            username: user.username,
            role: user.role,
            is_staff: user.is_staff,
        }
    }
}

impl Authorization for CurrentUser {
    fn role(&self) -> Role {
        self.role
    }

    fn is_staff(&self) -> bool {
        self.is_staff
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CurrentUser>().cloned().ok_or_else(|| {
            debug!("No authenticated user for {}", parts.uri);
            ApiError::Unauthorized
        })
    }
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentUser>().cloned())
    }
}

/// Bearer token from request, header with other scheme is an error
fn bearer_token(headers: &HeaderMap) -> ApiResult<Option<String>> {
    if !headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }
    match headers.typed_get::<AuthorizationHeader<Bearer>>() {
        Some(header) if !header.token().is_empty() => Ok(Some(header.token().to_string())),
        _ => {
            warn!("Authorization header is not a bearer token");
            Err(ApiError::Unauthorized)
        }
    }
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<CurrentUser>> {
    let Some(token) = bearer_token(headers)? else {
        return Ok(None);
    };

    let claim: ApiClaim = state.tokens().validate(&token).map_err(|e| {
        warn!("Rejected bearer token: {e}");
        ApiError::Unauthorized
    })?;
    let id = claim.user_id().ok_or_else(|| {
        warn!("Token subject is not user id: {}", claim.sub);
        ApiError::Unauthorized
    })?;

    // Account is reloaded, so role changes and deletions apply immediately
    match UserRepository::new(state.pool().clone()).get(id).await {
        Ok(user) => Ok(Some(user.into())),
        Err(yamdb_dal::Error::RecordNotFound(_)) => {
            warn!("Token for deleted user {}", claim.username);
            Err(ApiError::Unauthorized)
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolves optional bearer token to [`CurrentUser`] request extension.
///
/// Requests without token pass as anonymous, invalid or expired token is rejected with 401.
#[derive(Clone)]
pub struct TokenLayer {
    state: AppState,
}

impl TokenLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for TokenLayer {
    type Service = TokenService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct TokenService<S> {
    inner: S,
    state: AppState,
}

impl<S> Service<Request> for TokenService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();
        Box::pin(async move {
            match resolve_user(&state, req.headers()).await {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(user);
                }
                Ok(None) => {}
                Err(e) => return Ok(e.into_response()),
            }
            inner.call(req).await
        })
    }
}

/// Allows request only for authenticated user with one of the roles
/// (or staff flag, if enabled), must be applied inside [`TokenLayer`]
#[derive(Clone)]
pub struct RequiredRolesLayer {
    roles: Arc<[Role]>,
    allow_staff: bool,
}

impl RequiredRolesLayer {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            allow_staff: false,
        }
    }

    pub fn with_staff(mut self) -> Self {
        self.allow_staff = true;
        self
    }
}

impl<S> Layer<S> for RequiredRolesLayer {
    type Service = RequiredRolesService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequiredRolesService {
            inner,
            roles: self.roles.clone(),
            allow_staff: self.allow_staff,
        }
    }
}

#[derive(Clone)]
pub struct RequiredRolesService<S> {
    inner: S,
    roles: Arc<[Role]>,
    allow_staff: bool,
}

impl<S> RequiredRolesService<S> {
    fn check(&self, user: Option<&CurrentUser>) -> ApiResult<()> {
        match user {
            None => Err(ApiError::Unauthorized),
            Some(user) if user.has_any_role(self.roles.iter()) => Ok(()),
            Some(user) if self.allow_staff && user.is_staff() => Ok(()),
            Some(user) => {
                debug!("User {} with role {} not allowed", user.username, user.role);
                Err(ApiError::Forbidden(
                    "You do not have permission to perform this action".to_string(),
                ))
            }
        }
    }
}

impl<S> Service<Request> for RequiredRolesService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        if let Err(e) = self.check(req.extensions().get::<CurrentUser>()) {
            return Box::pin(futures::future::ready(Ok(e.into_response())));
        }
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(req).await })
    }
}

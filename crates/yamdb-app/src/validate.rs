use axum::extract::{FromRequest, FromRequestParts, Request};
use garde::Validate;
use http::request::Parts;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};

use crate::{error::ApiError, state::AppState};

/// Extractor wrapper, which validates extracted payload with garde.
///
/// Both extraction and validation failures are rejected as [`ApiError`],
/// so the client receives the standard error body with status 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct Garde<E>(pub E);

impl<E> Deref for Garde<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> DerefMut for Garde<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<E: Display> Display for Garde<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<E> Garde<E> {
    pub fn into_inner(self) -> E {
        self.0
    }
}

impl<Extractor, T> FromRequest<AppState> for Garde<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequest<AppState>,
    ApiError: From<<Extractor as FromRequest<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request(req, state).await?;
        inner.deref().validate()?;
        Ok(Garde(inner))
    }
}

impl<Extractor, T> FromRequestParts<AppState> for Garde<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequestParts<AppState>,
    ApiError: From<<Extractor as FromRequestParts<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request_parts(parts, state).await?;
        inner.deref().validate()?;
        Ok(Garde(inner))
    }
}

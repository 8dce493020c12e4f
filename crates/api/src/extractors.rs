//! Request extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::request::Parts,
};
use classroom_common::AppError;
use classroom_core::Claims;
use serde::de::DeserializeOwned;

use crate::middleware::TokenRejected;

fn claims_from(parts: &Parts) -> Result<Claims, AppError> {
    if let Some(claims) = parts.extensions.get::<Claims>() {
        return Ok(claims.clone());
    }
    if parts.extensions.get::<TokenRejected>().is_some() {
        return Err(AppError::InvalidToken);
    }
    Err(AppError::Unauthorized)
}

/// Any authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        claims_from(parts).map(Self)
    }
}

/// Authenticated teacher extractor.
#[derive(Debug, Clone)]
pub struct AuthTeacher {
    /// The teacher's user id.
    pub id: String,
}

impl<S> FromRequestParts<S> for AuthTeacher
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match claims_from(parts)? {
            Claims::Teacher { sub } => Ok(Self { id: sub }),
            Claims::Participant { .. } => Err(AppError::Forbidden(
                "Teacher account required".to_string(),
            )),
        }
    }
}

/// Authenticated participant extractor.
#[derive(Debug, Clone)]
pub struct AuthParticipant {
    /// The participant id.
    pub id: String,
    /// The session the participant joined.
    pub session_id: String,
}

impl<S> FromRequestParts<S> for AuthParticipant
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match claims_from(parts)? {
            Claims::Participant { sub, sid } => Ok(Self {
                id: sub,
                session_id: sid,
            }),
            Claims::Teacher { .. } => Err(AppError::Forbidden(
                "Join the session first".to_string(),
            )),
        }
    }
}

/// JSON body whose decoding failures render as validation errors.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection: JsonRejection| AppError::Validation(rejection.body_text()))
    }
}

use crate::api::error::ApiError;
use async_trait::async_trait;
use axum::Router;
use axum::extract::{FromRequest, FromRequestParts, Json, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

pub mod auth;
pub mod chatbot;
pub mod error;
pub mod metrics;

pub fn router() -> Router {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/chatbot", chatbot::router())
        .nest("/api/metrics", metrics::router())
}

/// JSON body whose every rejection (syntax, missing fields, wrong types, content type) is a
/// 400 in the API's error shape.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
        }
    }
}

/// The token of an `Authorization: Bearer <token>` header.
#[derive(Debug)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Err(ApiError::Unauthorized(
                "`Authorization` header is missing".to_owned(),
            ));
        };

        header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(|token| BearerToken(token.to_owned()))
            .ok_or_else(|| ApiError::Unauthorized("invalid bearer token".to_owned()))
    }
}

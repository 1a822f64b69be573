use crate::api::errors::ApiError;
use crate::core::session::Session;
use crate::infrastructure::entities::Role;
use async_trait::async_trait;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::str::FromStr;
use uuid::Uuid;

pub mod analytics;
pub mod errors;
pub mod extract;
pub mod guard;
pub mod leads;
pub mod meeting_requests;
pub mod messages;
pub mod webhooks;

pub const X_USER_ID: &str = "X-User-ID";
pub const X_USER_ROLE: &str = "X-User-Role";

/// All endpoints, to be nested under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/messages", messages::router())
        .nest("/meeting-requests", meeting_requests::router())
        .nest("/leads", leads::router())
        .nest("/analytics", analytics::router())
        .nest("/webhooks", webhooks::router())
}

/// The session forwarded by the authentication provider, if any.
///
/// Requests without identity headers resolve to `None`; malformed headers are rejected.
#[derive(Debug)]
pub struct ExtractSession(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, ApiError> {
        session_from_headers(&parts.headers).map(ExtractSession)
    }
}

fn session_from_headers(headers: &HeaderMap) -> Result<Option<Session>, ApiError> {
    match (headers.get(X_USER_ID), headers.get(X_USER_ROLE)) {
        (None, None) => Ok(None),
        (Some(user_id), Some(role)) => {
            let user_id = user_id
                .to_str()
                .ok()
                .and_then(|user_id| Uuid::from_str(user_id.trim()).ok())
                .ok_or_else(|| ApiError::BadRequest("invalid user id".to_owned()))?;
            let role = role
                .to_str()
                .ok()
                .and_then(|role| Role::from_str(role).ok())
                .ok_or_else(|| ApiError::BadRequest("invalid user role".to_owned()))?;
            Ok(Some(Session::new(user_id, role)))
        }
        (None, Some(_)) => Err(ApiError::BadRequest(format!(
            "`{X_USER_ID}` header is missing"
        ))),
        (Some(_), None) => Err(ApiError::BadRequest(format!(
            "`{X_USER_ROLE}` header is missing"
        ))),
    }
}

//! Role-based access control for every endpoint.
//!
//! Handlers take [`Authenticated`] or [`RequireRole`] as an argument; the role sets below are the
//! whole authorization policy.

use crate::api::ExtractSession;
use crate::api::errors::ApiError;
use crate::core::session::Session;
use crate::infrastructure::entities::Role;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use log::debug;
use std::marker::PhantomData;

pub trait RolePolicy: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

/// Every role, staff and clients alike.
#[derive(Debug)]
pub struct StaffOrClient;

impl RolePolicy for StaffOrClient {
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Editor, Role::Viewer, Role::Client];
}

#[derive(Debug)]
pub struct StaffOnly;

impl RolePolicy for StaffOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Editor, Role::Viewer];
}

/// Staff allowed to change records.
#[derive(Debug)]
pub struct Editors;

impl RolePolicy for Editors {
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Editor];
}

#[derive(Debug)]
pub struct ClientOnly;

impl RolePolicy for ClientOnly {
    const ALLOWED: &'static [Role] = &[Role::Client];
}

pub fn require_authenticated(session: Option<Session>) -> Result<Session, ApiError> {
    session.ok_or(ApiError::Unauthorized)
}

pub fn require_role(session: Option<Session>, allowed: &[Role]) -> Result<Session, ApiError> {
    let session = require_authenticated(session)?;
    if allowed.contains(&session.role) {
        Ok(session)
    } else {
        debug!(
            "user {} with role {} denied, requires one of {:?}",
            session.user_id, session.role, allowed
        );
        Err(ApiError::Forbidden)
    }
}

/// Any caller with a session.
#[derive(Debug)]
pub struct Authenticated(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let ExtractSession(session) = ExtractSession::from_request_parts(parts, state).await?;
        require_authenticated(session).map(Authenticated)
    }
}

/// A caller whose role is allowed by `P`.
#[derive(Debug)]
pub struct RequireRole<P: RolePolicy>(pub Session, pub PhantomData<P>);

#[async_trait]
impl<S, P> FromRequestParts<S> for RequireRole<P>
where
    S: Send + Sync,
    P: RolePolicy,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let ExtractSession(session) = ExtractSession::from_request_parts(parts, state).await?;
        require_role(session, P::ALLOWED).map(|session| RequireRole(session, PhantomData))
    }
}

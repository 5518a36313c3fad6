//! Viewer identity: who is looking at the catalog.
//!
//! A viewer is either an authenticated user or an anonymous visitor carrying
//! a random id in a cookie. The identity keys the per-viewer location cache
//! and drives the favorite-seller annotation; it is derived by the location
//! middleware and carried through the request as an extension, never passed
//! as an explicit request parameter.

use std::fmt;

use axum::{extract::FromRequestParts, http::request::Parts};
use farmstand_core::UserId;

use crate::error::AppError;

/// Identity of the current viewer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerId {
    /// Authenticated user.
    User(UserId),
    /// Anonymous visitor, keyed by the cookie token.
    Anonymous(String),
}

impl ViewerId {
    /// The authenticated user id, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Anonymous(_) => None,
        }
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Anonymous(token) => write!(f, "anon:{token}"),
        }
    }
}

/// Extractor for the viewer identity set by the location middleware.
pub struct Viewer(pub ViewerId);

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ViewerId>()
            .cloned()
            .map(Self)
            .ok_or_else(|| {
                AppError::Internal("viewer identity missing; location middleware not applied".into())
            })
    }
}

/// Extractor that requires an authenticated user.
///
/// Rejects with 401 for anonymous viewers.
pub struct RequireUser(pub UserId);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Viewer(viewer) = Viewer::from_request_parts(parts, state).await?;
        viewer
            .user_id()
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("authentication required".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_cache_key_shaped() {
        assert_eq!(ViewerId::User(UserId::new(42)).to_string(), "user:42");
        assert_eq!(
            ViewerId::Anonymous("a1b2c3d4e5f6".to_string()).to_string(),
            "anon:a1b2c3d4e5f6"
        );
    }

    #[test]
    fn test_user_id_only_for_authenticated() {
        assert_eq!(
            ViewerId::User(UserId::new(7)).user_id(),
            Some(UserId::new(7))
        );
        assert_eq!(ViewerId::Anonymous("tok".to_string()).user_id(), None);
    }
}

//! Favorite-farm endpoints.
//!
//! Both operations are idempotent; repeating one changes nothing and still
//! succeeds. The effect shows up as the `seller_is_favorite` annotation on
//! catalog rows.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use farmstand_core::UserId;

use crate::db::FavoriteRepository;
use crate::error::{AppError, Result};
use crate::models::viewer::RequireUser;
use crate::state::AppState;

/// POST /api/favorites/{seller_id}
pub async fn add_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(seller_id): Path<i32>,
) -> Result<StatusCode> {
    let seller = checked_seller(&state, user, seller_id).await?;

    FavoriteRepository::new(state.pool()).add(user, seller).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/favorites/{seller_id}
pub async fn remove_favorite(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(seller_id): Path<i32>,
) -> Result<StatusCode> {
    let seller = checked_seller(&state, user, seller_id).await?;

    FavoriteRepository::new(state.pool())
        .remove(user, seller)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Validate the target seller: it must exist and must not be the caller.
async fn checked_seller(state: &AppState, user: UserId, seller_id: i32) -> Result<UserId> {
    let seller = UserId::new(seller_id);

    if seller == user {
        return Err(AppError::BadRequest(
            "cannot favorite your own farm".to_string(),
        ));
    }

    if !FavoriteRepository::new(state.pool())
        .seller_exists(seller)
        .await?
    {
        return Err(AppError::NotFound(format!("seller {seller_id}")));
    }

    Ok(seller)
}

//! Favorites API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{FavoriteRepository, ProductRepository, RepoError};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Favorite, FavoriteCreate};

/// GET /api/favorites - 当前用户的收藏列表
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<Favorite>>> {
    let repo = FavoriteRepository::new(state.get_db());
    let favorites = repo.find_by_user(&user.id).await?;
    Ok(ApiResponse::success(
        favorites.into_iter().map(Into::into).collect(),
    ))
}

/// POST /api/favorites - 收藏商品 (重复收藏报错)
pub async fn add(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<FavoriteCreate>,
) -> AppResult<ApiResponse<Favorite>> {
    let products = ProductRepository::new(state.get_db());
    products
        .find_by_id(&payload.product_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {} not found", payload.product_id),
            )
        })?;

    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = FavoriteRepository::new(state.get_db());
    let favorite = repo
        .add(&user.id, &payload.product_id)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyFavorited, msg),
            other => other.into(),
        })?;

    tracing::info!(
        user_id = %user.id,
        product_id = %payload.product_id,
        "Product favorited"
    );

    Ok(ApiResponse::success(favorite.into()))
}

/// DELETE /api/favorites/:product_id - 取消收藏 (未收藏报错)
pub async fn remove(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = FavoriteRepository::new(state.get_db());
    let removed = repo
        .remove(&user.id, &product_id)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::FavoriteNotFound, msg),
            other => other.into(),
        })?;

    Ok(ApiResponse::success(removed))
}

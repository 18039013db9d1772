//! Cart API Handlers
//!
//! Writes run under the per-user lock so two requests from the same
//! account cannot interleave their read-modify-write cycles.

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::CartItem;
use crate::db::repository::{CartRepository, ProductRepository, RepoError, parse_id};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Cart, CartItemAdd, CartItemUpdate};

/// GET /api/cart - 获取当前用户购物车 (不存在则创建空车)
pub async fn get(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Cart>> {
    let repo = CartRepository::new(state.get_db());
    let cart = repo.get_or_create(&user.id).await?;
    Ok(ApiResponse::success(cart.into()))
}

/// POST /api/cart/items - 添加商品 (已存在则累加数量)
///
/// Catalog products are checked for stock and snapshotted at their
/// current price. A product id outside the catalog is accepted only
/// when the client supplies a price hint.
pub async fn add_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CartItemAdd>,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity < 1 {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("Quantity must be at least 1, got {}", payload.quantity),
        ));
    }

    let products = ProductRepository::new(state.get_db());
    let item = match products.find_by_id(&payload.product_id).await? {
        Some(product) => {
            if product.count_in_stock < payload.quantity {
                return Err(AppError::with_message(
                    ErrorCode::ProductOutOfStock,
                    format!(
                        "Only {} of {} in stock",
                        product.count_in_stock, product.name
                    ),
                ));
            }
            CartItem {
                product: parse_id(&payload.product_id)?,
                name: product.name,
                image: product.image,
                price: product.price,
                quantity: payload.quantity,
            }
        }
        None => {
            let price = payload.price_hint.ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProductNotFound,
                    format!("Product {} not found", payload.product_id),
                )
            })?;
            CartItem {
                product: parse_id(&payload.product_id)?,
                name: payload.name_hint.unwrap_or_default(),
                image: payload.image_hint.unwrap_or_default(),
                price,
                quantity: payload.quantity,
            }
        }
    };

    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = CartRepository::new(state.get_db());
    let cart = repo.add_item(&user.id, item).await?;

    tracing::info!(
        user_id = %user.id,
        product_id = %payload.product_id,
        quantity = payload.quantity,
        "Cart item added"
    );

    Ok(ApiResponse::success(cart.into()))
}

/// PUT /api/cart/items/:product_id - 覆盖某一商品的数量
pub async fn update_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<String>,
    Json(payload): Json<CartItemUpdate>,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity < 1 {
        return Err(AppError::with_message(
            ErrorCode::InvalidQuantity,
            format!("Quantity must be at least 1, got {}", payload.quantity),
        ));
    }

    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = CartRepository::new(state.get_db());
    let cart = repo
        .set_quantity(&user.id, &product_id, payload.quantity)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::CartItemNotFound, msg),
            other => other.into(),
        })?;

    Ok(ApiResponse::success(cart.into()))
}

/// DELETE /api/cart/items/:product_id - 移除商品 (不存在也成功)
pub async fn remove_item(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(product_id): Path<String>,
) -> AppResult<ApiResponse<Cart>> {
    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = CartRepository::new(state.get_db());
    let cart = repo.remove_item(&user.id, &product_id).await?;

    Ok(ApiResponse::success(cart.into()))
}

/// DELETE /api/cart - 清空购物车 (保留记录)
pub async fn clear(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Cart>> {
    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = CartRepository::new(state.get_db());
    let cart = repo.clear(&user.id).await?;

    tracing::info!(user_id = %user.id, "Cart cleared");

    Ok(ApiResponse::success(cart.into()))
}

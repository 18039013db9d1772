//! Product API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::Review;
use crate::db::repository::{ProductRepository, RepoError, parse_id};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Product, ProductCreate, ProductQuery, ProductUpdate, ReviewCreate};

fn product_not_found(msg: String) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, msg)
}

/// GET /api/products - 商品列表 (可按关键字/分类过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<ApiResponse<Vec<Product>>> {
    let repo = ProductRepository::new(state.get_db());
    let products = repo.find_all(query.keyword, query.category).await?;
    Ok(ApiResponse::success(
        products.into_iter().map(Into::into).collect(),
    ))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Product>> {
    let repo = ProductRepository::new(state.get_db());
    let product = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| product_not_found(format!("Product {} not found", id)))?;
    Ok(ApiResponse::success(product.into()))
}

/// POST /api/products - 创建商品 (管理员)
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<ApiResponse<Product>> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Product name must not be empty"));
    }
    if !payload.price.is_finite() || payload.price < 0.0 {
        return Err(AppError::validation("Product price must be non-negative"));
    }
    if payload.count_in_stock < 0 {
        return Err(AppError::validation("Stock count must be non-negative"));
    }

    let repo = ProductRepository::new(state.get_db());
    let product = repo.create(payload.into()).await?;

    tracing::info!(
        admin_id = %user.id,
        product = %product.name,
        "Product created"
    );

    Ok(ApiResponse::success(product.into()))
}

/// PUT /api/products/:id - 更新商品 (管理员)
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<ApiResponse<Product>> {
    if let Some(ref name) = payload.name
        && name.trim().is_empty()
    {
        return Err(AppError::validation("Product name must not be empty"));
    }
    if let Some(price) = payload.price
        && (!price.is_finite() || price < 0.0)
    {
        return Err(AppError::validation("Product price must be non-negative"));
    }
    if let Some(stock) = payload.count_in_stock
        && stock < 0
    {
        return Err(AppError::validation("Stock count must be non-negative"));
    }

    let repo = ProductRepository::new(state.get_db());
    let product = repo.update(&id, payload.into()).await.map_err(|e| match e {
        RepoError::NotFound(msg) => product_not_found(msg),
        other => other.into(),
    })?;

    tracing::info!(admin_id = %user.id, product_id = %id, "Product updated");

    Ok(ApiResponse::success(product.into()))
}

/// DELETE /api/products/:id - 删除商品 (管理员)
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let repo = ProductRepository::new(state.get_db());
    let deleted = repo.delete(&id).await.map_err(|e| match e {
        RepoError::NotFound(msg) => product_not_found(msg),
        other => other.into(),
    })?;

    tracing::info!(admin_id = %user.id, product_id = %id, "Product deleted");

    Ok(ApiResponse::success(deleted))
}

/// POST /api/products/:id/reviews - 添加评论 (每用户一条)
pub async fn add_review(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewCreate>,
) -> AppResult<ApiResponse<Product>> {
    if !(1.0..=5.0).contains(&payload.rating) {
        return Err(AppError::validation("Rating must be between 1 and 5"));
    }

    let review = Review {
        user: parse_id(&user.id)?,
        name: user.name.clone(),
        rating: payload.rating,
        comment: payload.comment,
        created_at: chrono::Utc::now(),
    };

    let repo = ProductRepository::new(state.get_db());
    let product = repo.add_review(&id, review).await.map_err(|e| match e {
        RepoError::NotFound(msg) => product_not_found(msg),
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::ReviewExists, msg),
        other => other.into(),
    })?;

    tracing::info!(user_id = %user.id, product_id = %id, "Review added");

    Ok(ApiResponse::success(product.into()))
}

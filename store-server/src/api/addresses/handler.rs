//! Address API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{AddressRepository, RepoError};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Address, AddressCreate, AddressUpdate};

fn address_not_found(msg: String) -> AppError {
    AppError::with_message(ErrorCode::AddressNotFound, msg)
}

/// GET /api/addresses - 当前用户的地址列表 (默认地址排最前)
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<Address>>> {
    let repo = AddressRepository::new(state.get_db());
    let addresses = repo.find_by_user(&user.id).await?;
    Ok(ApiResponse::success(
        addresses.into_iter().map(Into::into).collect(),
    ))
}

/// POST /api/addresses - 添加地址
///
/// Content dedup: posting the same street, city and postal code again
/// returns the record that already exists.
pub async fn add(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AddressCreate>,
) -> AppResult<ApiResponse<Address>> {
    for (field, value) in [
        ("name", &payload.name),
        ("phone", &payload.phone),
        ("street", &payload.street),
        ("city", &payload.city),
        ("postal_code", &payload.postal_code),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::validation(format!(
                "Address {} must not be empty",
                field
            )));
        }
    }

    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = AddressRepository::new(state.get_db());
    let address = repo.add(&user.id, payload.into()).await?;

    tracing::info!(user_id = %user.id, city = %address.city, "Address saved");

    Ok(ApiResponse::success(address.into()))
}

/// PUT /api/addresses/:id - 修改地址字段 (不含默认标记)
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<AddressUpdate>,
) -> AppResult<ApiResponse<Address>> {
    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = AddressRepository::new(state.get_db());
    let address = repo
        .update(&user.id, &id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(msg) => address_not_found(msg),
            other => other.into(),
        })?;

    Ok(ApiResponse::success(address.into()))
}

/// PUT /api/addresses/:id/default - 设为默认地址
pub async fn set_default(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Address>> {
    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = AddressRepository::new(state.get_db());
    let address = repo
        .set_default(&user.id, &id)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(msg) => address_not_found(msg),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, address_id = %id, "Default address changed");

    Ok(ApiResponse::success(address.into()))
}

/// DELETE /api/addresses/:id - 删除地址
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = AddressRepository::new(state.get_db());
    let deleted = repo.delete(&user.id, &id).await.map_err(|e| match e {
        RepoError::NotFound(msg) => address_not_found(msg),
        other => other.into(),
    })?;

    Ok(ApiResponse::success(deleted))
}

//! Payment Method API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{PaymentMethodRepository, RepoError};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{PaymentDetail, PaymentMethod, PaymentMethodCreate};

fn method_not_found(msg: String) -> AppError {
    AppError::with_message(ErrorCode::PaymentMethodNotFound, msg)
}

/// GET /api/payment-methods - 当前用户的支付方式列表
pub async fn list(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<PaymentMethod>>> {
    let repo = PaymentMethodRepository::new(state.get_db());
    let methods = repo.find_by_user(&user.id).await?;
    Ok(ApiResponse::success(
        methods.into_iter().map(Into::into).collect(),
    ))
}

/// POST /api/payment-methods - 添加支付方式
///
/// Content dedup: the same card (by last four digits) or UPI handle
/// posted twice returns the stored record.
pub async fn add(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PaymentMethodCreate>,
) -> AppResult<ApiResponse<PaymentMethod>> {
    match &payload.detail {
        PaymentDetail::Upi { handle } => {
            if handle.trim().is_empty() {
                return Err(AppError::validation("UPI handle must not be empty"));
            }
        }
        PaymentDetail::Card { number, holder, .. } => {
            if number.trim().len() < 4 || !number.trim().chars().all(|c| c.is_ascii_digit()) {
                return Err(AppError::validation(
                    "Card number must be at least 4 digits",
                ));
            }
            if holder.trim().is_empty() {
                return Err(AppError::validation("Card holder must not be empty"));
            }
        }
    }

    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = PaymentMethodRepository::new(state.get_db());
    let method = repo.add(&user.id, payload.detail).await?;

    tracing::info!(
        user_id = %user.id,
        kind = %method.detail.kind(),
        "Payment method saved"
    );

    Ok(ApiResponse::success(method.into()))
}

/// PUT /api/payment-methods/:id/default - 设为该类型的默认支付方式
pub async fn set_default(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PaymentMethod>> {
    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = PaymentMethodRepository::new(state.get_db());
    let method = repo
        .set_default(&user.id, &id)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(msg) => method_not_found(msg),
            other => other.into(),
        })?;

    tracing::info!(
        user_id = %user.id,
        method_id = %id,
        kind = %method.detail.kind(),
        "Default payment method changed"
    );

    Ok(ApiResponse::success(method.into()))
}

/// DELETE /api/payment-methods/:id - 删除支付方式
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let _guard = state.user_locks.acquire(&user.id).await;

    let repo = PaymentMethodRepository::new(state.get_db());
    let deleted = repo.delete(&user.id, &id).await.map_err(|e| match e {
        RepoError::NotFound(msg) => method_not_found(msg),
        other => other.into(),
    })?;

    Ok(ApiResponse::success(deleted))
}

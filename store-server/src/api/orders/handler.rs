//! Order API Handlers
//!
//! Placement snapshots prices, names and the shipping address into the
//! order record; later catalog or address edits never touch past
//! orders. Status changes re-read the order under the owner's lock so
//! the authorization check runs against the stored status, not a stale
//! one.

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;

use crate::api::convert::record_id_to_string;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models as db;
use crate::db::repository::{
    AddressRepository, OrderRepository, ProductRepository, RepoError, parse_id,
};
use crate::orders::{lifecycle, money};
use crate::security_log;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Order, OrderCreate, OrderStatus, OrderStatusUpdate, PaymentResult};

/// Query params for the admin order listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

fn order_not_found(id: &str) -> AppError {
    AppError::with_message(ErrorCode::OrderNotFound, format!("Order {} not found", id))
}

/// POST /api/orders - 下单
///
/// The cart is left untouched; clearing it after checkout is the
/// client's decision.
pub async fn place(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<OrderCreate>,
) -> AppResult<ApiResponse<Order>> {
    money::validate_order_items(&payload.items)?;

    if payload.payment_method.trim().is_empty() {
        return Err(AppError::validation("A payment method is required"));
    }

    let addresses = AddressRepository::new(state.get_db());
    let address = addresses
        .find_by_id(&payload.address_id)
        .await?
        .filter(|a| record_id_to_string(&a.user) == user.id)
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::AddressNotFound,
                format!("Address {} not found", payload.address_id),
            )
        })?;

    let _guard = state.user_locks.acquire(&user.id).await;

    // Reserve stock line by line. Items that are not catalog products
    // pass through with the prices the client sent, already validated
    // above.
    let products = ProductRepository::new(state.get_db());
    let mut items = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let product = parse_id(&item.product_id).map_err(|_| {
            AppError::with_message(
                ErrorCode::InvalidOrderItem,
                format!("Order item has an invalid product id: {}", item.product_id),
            )
        })?;

        if products.find_by_id(&item.product_id).await?.is_some() {
            products
                .take_stock(&item.product_id, item.quantity)
                .await
                .map_err(|e| match e {
                    RepoError::Validation(msg) => {
                        AppError::with_message(ErrorCode::ProductOutOfStock, msg)
                    }
                    other => other.into(),
                })?;
        }

        items.push(db::OrderItem {
            product,
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            image: item.image.clone(),
        });
    }

    let totals = money::calculate_totals(&payload.items);

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .create(db::Order {
            id: None,
            user: parse_id(&user.id)?,
            items,
            shipping_address: db::OrderAddress::from(&address),
            payment_method: payload.payment_method,
            payment_result: payload.payment_result,
            subtotal: totals.subtotal,
            shipping_fee: totals.shipping_fee,
            total: totals.total,
            status: OrderStatus::Pending,
            notes: payload.notes,
            created_at: chrono::Utc::now(),
        })
        .await?;

    tracing::info!(
        user_id = %user.id,
        order_id = %order.id.as_ref().map(record_id_to_string).unwrap_or_default(),
        total = order.total,
        "Order placed"
    );

    Ok(ApiResponse::success(order.into()))
}

/// GET /api/orders/mine - 当前用户的订单列表
pub async fn list_mine(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let repo = OrderRepository::new(state.get_db());
    let orders = repo.find_by_user(&user.id).await?;
    Ok(ApiResponse::success(
        orders.into_iter().map(Into::into).collect(),
    ))
}

/// GET /api/orders - 全部订单, 分页 (管理员)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let repo = OrderRepository::new(state.get_db());
    let orders = repo.find_all(query.limit, query.offset).await?;
    Ok(ApiResponse::success(
        orders.into_iter().map(Into::into).collect(),
    ))
}

/// GET /api/orders/:id - 获取单个订单
///
/// Someone else's order id reads as not found, the same as an id that
/// never existed.
pub async fn get_by_id(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| order_not_found(&id))?;

    if !user.is_admin && !user.owns(&record_id_to_string(&order.user)) {
        return Err(order_not_found(&id));
    }

    Ok(ApiResponse::success(order.into()))
}

/// PUT /api/orders/:id/status - 状态流转
///
/// The raw value is parsed before anything is fetched, so an unknown
/// status never reveals whether the order exists.
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<ApiResponse<Order>> {
    let requested = lifecycle::parse_status(&payload.status)?;

    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| order_not_found(&id))?;
    let owner_id = record_id_to_string(&order.user);

    // Serialize against other writes to the owner's orders, then
    // re-read so the transition check sees the current status.
    let _guard = state.user_locks.acquire(&owner_id).await;
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| order_not_found(&id))?;

    let is_owner = user.owns(&owner_id);
    if let Err(e) = lifecycle::authorize_transition(order.status, requested, user.is_admin, is_owner)
    {
        security_log!(
            "WARN",
            "order_status_denied",
            user_id = user.id.as_str(),
            order_id = id.as_str(),
            from = order.status.as_str(),
            to = requested.as_str()
        );
        return Err(e);
    }

    let updated = repo.update_status(&id, requested).await.map_err(|e| match e {
        RepoError::NotFound(_) => order_not_found(&id),
        other => other.into(),
    })?;

    tracing::info!(
        user_id = %user.id,
        order_id = %id,
        from = %order.status,
        to = %requested,
        "Order status changed"
    );

    Ok(ApiResponse::success(updated.into()))
}

/// POST /api/orders/:id/pay - 记录支付结果
///
/// The gateway payload is stored verbatim. An empty transaction id is
/// replaced with a generated one so the receipt stays addressable.
pub async fn pay(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(mut payload): Json<PaymentResult>,
) -> AppResult<ApiResponse<Order>> {
    let repo = OrderRepository::new(state.get_db());
    let order = repo
        .find_by_id(&id)
        .await?
        .ok_or_else(|| order_not_found(&id))?;
    let owner_id = record_id_to_string(&order.user);

    if !user.is_admin && !user.owns(&owner_id) {
        return Err(order_not_found(&id));
    }

    if payload.id.trim().is_empty() {
        payload.id = uuid::Uuid::new_v4().to_string();
    }

    let _guard = state.user_locks.acquire(&owner_id).await;

    let updated = repo
        .set_payment_result(&id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => order_not_found(&id),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, order_id = %id, "Payment result recorded");

    Ok(ApiResponse::success(updated.into()))
}

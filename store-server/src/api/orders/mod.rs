//! Order API 模块
//!
//! 下单、查询、支付回执与状态流转。状态机与金额计算在
//! [`crate::orders`] 中实现，这里只做路由与鉴权编排。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let member_routes = Router::new()
        .route("/", post(handler::place))
        .route("/mine", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/pay", post(handler::pay));

    let admin_routes = Router::new()
        .route("/", get(handler::list))
        .layer(middleware::from_fn(require_admin));

    member_routes.merge(admin_routes)
}

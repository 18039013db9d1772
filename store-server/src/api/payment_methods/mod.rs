//! Payment Method API 模块
//!
//! 默认支付方式按类型 (upi/card) 各维护一个。卡安全码从不入库。

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/payment-methods", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::add))
        .route("/{id}", delete(handler::delete))
        .route("/{id}/default", put(handler::set_default))
}

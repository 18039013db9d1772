//! Cart API 模块
//!
//! 全部路由需要登录。购物车按用户懒创建，清空后保留记录。

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get).delete(handler::clear))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{product_id}",
            put(handler::update_item).delete(handler::remove_item),
        )
}

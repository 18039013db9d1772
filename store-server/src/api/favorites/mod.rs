//! Favorites API 模块
//!
//! 收藏是 (用户, 商品) 对，重复收藏与移除未收藏的商品都会报错。

mod handler;

use axum::{
    Router,
    routing::{delete, get},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/favorites", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::add))
        .route("/{product_id}", delete(handler::remove))
}

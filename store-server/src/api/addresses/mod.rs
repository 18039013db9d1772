//! Address API 模块
//!
//! 地址簿。每个用户最多一个默认地址，首个地址自动成为默认。

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/addresses", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::add))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/default", put(handler::set_default))
}

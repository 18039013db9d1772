//! Auth API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // 公共路由 (require_auth 中间件跳过)
        .route("/register", post(handler::register))
        .route("/login", post(handler::login))
        // 受保护路由
        .route("/me", get(handler::me))
        .route("/profile", put(handler::update_profile))
}

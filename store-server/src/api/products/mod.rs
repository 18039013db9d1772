//! Product API 模块
//!
//! 目录读取公开；写操作仅管理员；评论需登录。

mod handler;

use axum::{Router, middleware, routing::get, routing::post};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let review_routes = Router::new().route("/{id}/reviews", post(handler::add_review));

    let admin_routes = Router::new()
        .route("/", post(handler::create))
        .route(
            "/{id}",
            axum::routing::put(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(review_routes).merge(admin_routes)
}

//! Dining Table API 模块
//!
//! Customer-facing routes under the same prefix (`/{id}/session`,
//! `/{id}/orders`) live in `api::ordering`.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/tables", get(handler::list).post(handler::create))
        .route("/api/tables/{id}", get(handler::get_by_id).put(handler::update))
        .route("/api/tables/{id}/reserve", post(handler::reserve))
        .route("/api/tables/{id}/release", post(handler::release))
}

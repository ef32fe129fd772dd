//! Table Session API 模块 (staff / payment collaborator)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/sessions", get(handler::list_active))
        .route("/api/sessions/cleanup", post(handler::cleanup))
        .route("/api/sessions/{id}", get(handler::get_by_id))
        .route("/api/sessions/{id}/payments", post(handler::record_payment))
        .route("/api/sessions/{id}/complete", post(handler::complete))
}

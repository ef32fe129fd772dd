//! API 路由模块
//!
//! - [`health`] - 健康检查
//! - [`ordering`] - 顾客扫码开台、访问判定、下单
//! - [`sessions`] - 会话查询、付款、结账、手动回收
//! - [`tables`] - 桌台管理与预订

pub mod health;
pub mod logging;
pub mod ordering;
pub mod sessions;
pub mod tables;

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::core::ServerState;

/// Build the Axum router (without state)
pub fn routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(ordering::router())
        .merge(sessions::router())
        .merge(tables::router())
}

/// Full application with state and HTTP middleware
pub fn build_app(state: ServerState) -> Router {
    let timeout = state.config.request_timeout();
    routes()
        .with_state(state)
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging::logging_middleware))
}

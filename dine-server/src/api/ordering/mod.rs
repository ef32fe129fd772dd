//! Customer self-ordering API
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/access?table_id= | GET | 桌台访问判定 |
//! | /api/tables/{id}/session | POST | 扫码开台 / 回到自己的会话 |
//! | /api/tables/{id}/orders | POST | 下单挂到会话 (需会话令牌) |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/access", get(handler::check_access))
        .route("/api/tables/{id}/session", post(handler::scan))
        .route("/api/tables/{id}/orders", post(handler::add_order))
}

//! Table Session API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{CleanupReport, SessionCleanupRequest, SessionPaymentAdd, TableSession};

use crate::core::ServerState;
use crate::sessions::run_manual_cleanup;
use crate::utils::AppResult;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub branch_id: i64,
}

/// GET /api/sessions?branch_id= - 门店当前所有进行中的会话
pub async fn list_active(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<TableSession>>> {
    Ok(Json(state.sessions.list_active(query.branch_id).await?))
}

/// GET /api/sessions/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TableSession>> {
    Ok(Json(state.sessions.find_by_id(id).await?))
}

/// POST /api/sessions/{id}/payments - 记录付款金额
pub async fn record_payment(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<SessionPaymentAdd>,
) -> AppResult<Json<TableSession>> {
    Ok(Json(state.sessions.record_payment(id, payload.amount).await?))
}

/// POST /api/sessions/{id}/complete - 结账完成，释放桌台
pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<TableSession>> {
    Ok(Json(state.sessions.complete_session(id).await?))
}

/// POST /api/sessions/cleanup - 手动回收闲置会话
///
/// `hours_inactive` 缺省时使用配置值；与定时回收互斥。
pub async fn cleanup(
    State(state): State<ServerState>,
    Json(payload): Json<SessionCleanupRequest>,
) -> AppResult<Json<CleanupReport>> {
    let hours = payload
        .hours_inactive
        .unwrap_or(state.config.session_inactive_hours);
    let report = run_manual_cleanup(&state.sessions, &state.reclaim_guard, hours).await?;
    Ok(Json(report))
}

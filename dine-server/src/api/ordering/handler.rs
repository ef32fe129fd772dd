//! Customer Self-Ordering Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderValue, header},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use shared::models::{SessionOrderAdd, TableSession};

use crate::access::{self, CallerIdentity, TableAccess};
use crate::access::identity::SESSION_COOKIE;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub table_id: Option<i64>,
}

/// QR scan payload; the code carries the branch
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub branch_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub session: TableSession,
    pub is_new: bool,
    pub message: String,
}

/// GET /api/access?table_id= - 判定访问结果
///
/// Unavailable → 404, Occupied → 409 (with `started_at`, `can_notify`).
pub async fn check_access(
    State(state): State<ServerState>,
    Query(query): Query<AccessQuery>,
    caller: CallerIdentity,
) -> AppResult<Json<TableAccess>> {
    let access = access::check_table_access(&state.sessions, query.table_id, &caller).await?;
    Ok(Json(access.into_result()?))
}

/// POST /api/tables/{id}/session - 扫码开台
///
/// Opens a session on a free table or returns the caller's own. The
/// token is (re)issued as an HttpOnly cookie.
pub async fn scan(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
    caller: CallerIdentity,
    Json(req): Json<ScanRequest>,
) -> AppResult<impl IntoResponse> {
    let access = access::check_table_access(&state.sessions, Some(table_id), &caller)
        .await?
        .into_result()?;

    let (session, is_new, message) = match access {
        TableAccess::Owned { session } => (session, false, "Existing session".to_string()),
        _ => {
            // Only a new session needs an identity to bind; a token holder
            // re-scanning is already Owned above
            let owner = caller.as_owner().ok_or_else(|| {
                AppError::validation("A customer id or a device id is required to open a table")
            })?;
            let outcome = state
                .sessions
                .create_or_get_session(table_id, req.branch_id, &owner)
                .await?;
            // A stranger may have opened the table since the guard ran
            match access::recheck_after_create(&caller, outcome.session, outcome.is_new)
                .into_result()?
            {
                TableAccess::Owned { session } => (session, outcome.is_new, outcome.message),
                _ => return Err(AppError::internal("Unexpected access outcome after create")),
            }
        }
    };

    if session.branch_id != req.branch_id {
        return Err(AppError::table_unavailable(table_id));
    }

    let cookie = HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={}; HttpOnly; SameSite=Lax; Path=/",
        session.session_token.as_str()
    ))
    .map_err(|_| AppError::internal("Session token is not a valid header value"))?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(ScanResponse {
            session,
            is_new,
            message,
        }),
    ))
}

/// POST /api/tables/{id}/orders - 下单挂到桌台会话
///
/// Requires the token of the table's active session (cookie or
/// `x-session-token`).
pub async fn add_order(
    State(state): State<ServerState>,
    Path(table_id): Path<i64>,
    caller: CallerIdentity,
    Json(payload): Json<SessionOrderAdd>,
) -> AppResult<Json<TableSession>> {
    let token = caller
        .session_token
        .as_deref()
        .ok_or_else(AppError::session_token_invalid)?;
    let session = state
        .sessions
        .validate_session(token, table_id)
        .await
        .ok_or_else(AppError::session_token_invalid)?;

    let session = state
        .sessions
        .add_order_to_session(session.id, &payload.order_id, payload.amount)
        .await?;
    Ok(Json(session))
}

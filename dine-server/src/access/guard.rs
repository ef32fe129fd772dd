//! Table access guard
//!
//! Decides what a caller arriving with (or without) a table id may do.
//! Reservations are not consulted here.

use serde::Serialize;
use shared::error::AppError;
use shared::models::TableSession;

use super::identity::CallerIdentity;
use crate::db::repository::dining_table;
use crate::sessions::{SessionError, SessionManager, SessionResult};

/// Outcome of [`check_table_access`]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum TableAccess {
    /// No table context, plain menu browsing
    Browse,
    /// Table missing or out of service
    Unavailable { table_id: i64 },
    /// Table free, a scan may open a session
    Open { table_id: i64 },
    /// Caller owns the table's active session
    Owned { session: TableSession },
    /// Someone else's session holds the table
    Occupied {
        table_id: i64,
        started_at: i64,
        can_notify: bool,
    },
}

impl TableAccess {
    fn occupied(session: &TableSession) -> Self {
        TableAccess::Occupied {
            table_id: session.table_id,
            started_at: session.started_at,
            can_notify: true,
        }
    }

    /// Map the refusing outcomes to their API errors
    pub fn into_result(self) -> Result<TableAccess, AppError> {
        match self {
            TableAccess::Unavailable { table_id } => Err(AppError::table_unavailable(table_id)),
            TableAccess::Occupied {
                table_id,
                started_at,
                can_notify,
            } => Err(AppError::table_occupied(table_id, started_at, can_notify)),
            other => Ok(other),
        }
    }
}

/// Whether `caller` owns `session`, by identity or by presenting its token
pub fn is_owner(caller: &CallerIdentity, session: &TableSession) -> bool {
    if caller.owns(session) {
        return true;
    }
    caller
        .session_token
        .as_deref()
        .is_some_and(|t| crate::sessions::token::matches(t, &session.session_token))
}

pub async fn check_table_access(
    sessions: &SessionManager,
    table_id: Option<i64>,
    caller: &CallerIdentity,
) -> SessionResult<TableAccess> {
    let Some(table_id) = table_id else {
        return Ok(TableAccess::Browse);
    };

    match dining_table::find_by_id(sessions.pool(), table_id).await? {
        Some(table) if table.is_active => {}
        _ => return Ok(TableAccess::Unavailable { table_id }),
    }

    let Some(session) = sessions.find_active_for_table(table_id).await? else {
        return Ok(TableAccess::Open { table_id });
    };

    if !is_owner(caller, &session) {
        tracing::debug!(table_id, "Table held by another party");
        return Ok(TableAccess::occupied(&session));
    }

    match sessions.touch_session(session.id).await {
        Ok(()) => Ok(TableAccess::Owned { session }),
        // Reclaimed or completed between the read and the touch
        Err(SessionError::InvalidState { .. } | SessionError::NotFound(_)) => {
            Ok(TableAccess::Open { table_id })
        }
        Err(e) => Err(e),
    }
}

/// Re-check after `create_or_get_session`: a caller who raced a stranger
/// to an open table and lost gets `Occupied`, not the stranger's session.
pub fn recheck_after_create(
    caller: &CallerIdentity,
    session: TableSession,
    is_new: bool,
) -> TableAccess {
    if is_new || is_owner(caller, &session) {
        TableAccess::Owned { session }
    } else {
        TableAccess::occupied(&session)
    }
}

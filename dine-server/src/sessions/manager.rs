//! Session Manager
//!
//! Owns the table session state machine:
//!
//! ```text
//!            create_or_get
//!   (none) ───────────────▶ ACTIVE ──complete──▶ COMPLETED
//!                             │
//!                             └──cleanup──▶ ABANDONED
//! ```
//!
//! Each mutation is one transaction whose first statement is a write, so
//! SQLite never has to upgrade a read lock under contention. Table
//! availability changes go through `tables::occupancy` in the same
//! transaction as the status change they follow.

use serde::Serialize;
use shared::models::{CleanupReport, SessionOwner, TableSession};
use shared::util::{hours_to_millis, now_millis, snowflake_id};
use sqlx::{SqliteConnection, SqlitePool};

use super::error::{AmountKind, SessionError, SessionResult};
use super::token;
use crate::db::repository::{RepoError, dining_table, table_session};
use crate::tables::occupancy;

/// Attempts before a lost creation race is reported as a conflict
const MAX_CREATE_ATTEMPTS: usize = 3;

/// Result of [`SessionManager::create_or_get_session`]
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session: TableSession,
    pub is_new: bool,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct SessionManager {
    pool: SqlitePool,
}

impl SessionManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Return the table's active session, or open one.
    ///
    /// Concurrent callers for the same free table all end up with the
    /// same session: the loser of the insert race hits the partial unique
    /// index, rolls back and takes the existing-session path.
    pub async fn create_or_get_session(
        &self,
        table_id: i64,
        branch_id: i64,
        owner: &SessionOwner,
    ) -> SessionResult<SessionOutcome> {
        let table = dining_table::find_by_id(&self.pool, table_id).await?;
        match table {
            Some(t) if t.branch_id == branch_id && t.is_active => {}
            _ => return Err(SessionError::TableNotFound(table_id)),
        }

        let (customer_id, guest_device_id, guest_ip) = match owner {
            SessionOwner::Customer { customer_id } => (Some(*customer_id), None, None),
            SessionOwner::Guest(guest) => {
                (None, Some(guest.device_id.clone()), guest.ip_address.clone())
            }
        };

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let now = now_millis();
            let mut tx = self.pool.begin().await?;

            if let Some(session) =
                table_session::touch_active_for_table(&mut *tx, table_id, now).await?
            {
                tx.commit().await?;
                tracing::debug!(session_id = session.id, table_id, "Existing table session resumed");
                return Ok(SessionOutcome {
                    session,
                    is_new: false,
                    message: "Existing session".to_string(),
                });
            }

            let new = table_session::NewTableSession {
                id: snowflake_id(),
                session_token: token::generate(),
                table_id,
                branch_id,
                customer_id,
                guest_device_id: guest_device_id.clone(),
                guest_ip: guest_ip.clone(),
                now,
            };

            match table_session::insert(&mut *tx, &new).await {
                Ok(Some(session)) => {
                    occupancy::occupy_for_session(&mut *tx, table_id).await?;
                    tx.commit().await?;
                    tracing::info!(
                        session_id = session.id,
                        table_id,
                        branch_id,
                        "Table session opened"
                    );
                    return Ok(SessionOutcome {
                        session,
                        is_new: true,
                        message: "New session created".to_string(),
                    });
                }
                // Table went out of service after the check above
                Ok(None) => {
                    tx.rollback().await?;
                    return Err(SessionError::TableNotFound(table_id));
                }
                Err(RepoError::Duplicate(_)) => {
                    tx.rollback().await?;
                    tracing::debug!(table_id, attempt, "Lost session creation race, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(table_id, "Session creation kept conflicting, giving up");
        Err(SessionError::Conflict(format!(
            "Could not open a session on table {table_id}"
        )))
    }

    /// Attach an order and add its amount to the running total
    pub async fn add_order_to_session(
        &self,
        session_id: i64,
        order_id: &str,
        amount: f64,
    ) -> SessionResult<TableSession> {
        check_amount(AmountKind::Order, amount)?;
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(SessionError::Validation("Order id cannot be empty".into()));
        }

        let mut tx = self.pool.begin().await?;
        match table_session::add_order(&mut *tx, session_id, order_id, amount, now_millis()).await {
            Ok(Some(session)) => {
                tx.commit().await?;
                tracing::info!(
                    session_id,
                    order_id,
                    amount,
                    total = session.total_amount,
                    "Order attached to table session"
                );
                Ok(session)
            }
            Ok(None) => Err(not_active(&mut *tx, session_id).await),
            Err(RepoError::Duplicate(_)) => Err(SessionError::DuplicateOrder {
                session_id,
                order_id: order_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Add to the paid amount of an active session
    pub async fn record_payment(&self, session_id: i64, amount: f64) -> SessionResult<TableSession> {
        check_amount(AmountKind::Payment, amount)?;

        let mut tx = self.pool.begin().await?;
        match table_session::add_payment(&mut *tx, session_id, amount, now_millis()).await? {
            Some(session) => {
                tx.commit().await?;
                tracing::info!(session_id, amount, paid = session.paid_amount, "Payment recorded");
                Ok(session)
            }
            None => Err(not_active(&mut *tx, session_id).await),
        }
    }

    /// ACTIVE → COMPLETED, and free the table
    pub async fn complete_session(&self, session_id: i64) -> SessionResult<TableSession> {
        let mut tx = self.pool.begin().await?;
        match table_session::complete(&mut *tx, session_id, now_millis()).await? {
            Some(session) => {
                occupancy::release_from_session(&mut *tx, session.table_id).await?;
                tx.commit().await?;
                tracing::info!(
                    session_id,
                    table_id = session.table_id,
                    total = session.total_amount,
                    "Table session completed"
                );
                Ok(session)
            }
            None => Err(not_active(&mut *tx, session_id).await),
        }
    }

    /// Active session of `table_id`, only if `token` belongs to it.
    ///
    /// Never fails: bad, stale or foreign tokens and storage errors all
    /// yield `None`.
    pub async fn validate_session(&self, token: &str, table_id: i64) -> Option<TableSession> {
        match table_session::find_active_for_table(&self.pool, table_id).await {
            Ok(Some(session)) if token::matches(token, &session.session_token) => Some(session),
            Ok(_) => None,
            Err(e) => {
                tracing::error!(table_id, error = %e, "Session validation failed");
                None
            }
        }
    }

    /// Bump activity on an active session
    pub async fn touch_session(&self, session_id: i64) -> SessionResult<()> {
        if table_session::touch(&self.pool, session_id, now_millis()).await? {
            return Ok(());
        }
        match table_session::status_of(&self.pool, session_id).await? {
            None => Err(SessionError::NotFound(session_id)),
            Some(status) => Err(SessionError::InvalidState { session_id, status }),
        }
    }

    pub async fn find_by_id(&self, session_id: i64) -> SessionResult<TableSession> {
        table_session::find_by_id(&self.pool, session_id)
            .await?
            .ok_or(SessionError::NotFound(session_id))
    }

    pub async fn find_active_for_table(&self, table_id: i64) -> SessionResult<Option<TableSession>> {
        Ok(table_session::find_active_for_table(&self.pool, table_id).await?)
    }

    pub async fn list_active(&self, branch_id: i64) -> SessionResult<Vec<TableSession>> {
        Ok(table_session::find_active_by_branch(&self.pool, branch_id).await?)
    }

    /// Abandon every active session idle for at least `hours_inactive`.
    ///
    /// One cutoff for the whole run; a session whose last activity equals
    /// the cutoff is reclaimed. Running it again right away reports zero.
    pub async fn cleanup_abandoned_sessions(
        &self,
        hours_inactive: u64,
    ) -> SessionResult<CleanupReport> {
        self.cleanup_abandoned_sessions_at(hours_inactive, now_millis())
            .await
    }

    /// Same sweep with the clock supplied by the caller
    pub async fn cleanup_abandoned_sessions_at(
        &self,
        hours_inactive: u64,
        now: i64,
    ) -> SessionResult<CleanupReport> {
        if hours_inactive == 0 {
            return Err(SessionError::Validation(
                "hours_inactive must be at least 1".into(),
            ));
        }
        let cutoff = now.saturating_sub(hours_to_millis(hours_inactive));

        let mut tx = self.pool.begin().await?;
        let abandoned = table_session::abandon_stale(&mut *tx, cutoff).await?;
        for session in &abandoned {
            occupancy::release_from_session(&mut *tx, session.table_id).await?;
        }
        tx.commit().await?;

        for session in &abandoned {
            tracing::info!(
                session_id = session.id,
                table_id = session.table_id,
                branch_id = session.branch_id,
                last_activity_at = session.last_activity_at,
                "Table session abandoned"
            );
        }

        Ok(CleanupReport {
            cleaned: abandoned.len(),
            cutoff,
            sessions: abandoned.iter().map(Into::into).collect(),
        })
    }
}

fn check_amount(kind: AmountKind, amount: f64) -> SessionResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(SessionError::InvalidAmount { kind, amount });
    }
    Ok(())
}

/// Explain why a conditional write on `session_id` matched nothing
async fn not_active(conn: &mut SqliteConnection, session_id: i64) -> SessionError {
    match table_session::status_of(conn, session_id).await {
        Ok(None) => SessionError::NotFound(session_id),
        Ok(Some(status)) => SessionError::InvalidState { session_id, status },
        Err(e) => e.into(),
    }
}

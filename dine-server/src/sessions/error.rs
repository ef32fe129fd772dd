//! Session errors

use shared::error::{AppError, ErrorCode};
use shared::models::SessionStatus;
use thiserror::Error;

use crate::db::repository::RepoError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Table missing, in another branch, or out of service
    #[error("Table {0} not found")]
    TableNotFound(i64),

    #[error("Table session {0} not found")]
    NotFound(i64),

    /// Session is COMPLETED or ABANDONED
    #[error("Table session {session_id} is {status}")]
    InvalidState {
        session_id: i64,
        status: SessionStatus,
    },

    #[error("Order {order_id} is already attached to session {session_id}")]
    DuplicateOrder { session_id: i64, order_id: String },

    /// Lost a write race more times than we retry
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Session cleanup is already running")]
    CleanupInProgress,

    #[error("Invalid {kind} amount: {amount}")]
    InvalidAmount { kind: AmountKind, amount: f64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Order,
    Payment,
}

impl std::fmt::Display for AmountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmountKind::Order => write!(f, "order"),
            AmountKind::Payment => write!(f, "payment"),
        }
    }
}

impl From<sqlx::Error> for SessionError {
    fn from(err: sqlx::Error) -> Self {
        SessionError::Repo(err.into())
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::TableNotFound(table_id) => {
                AppError::with_message(ErrorCode::TableNotFound, message)
                    .with_detail("table_id", table_id)
            }
            SessionError::NotFound(session_id) => {
                AppError::with_message(ErrorCode::SessionNotFound, message)
                    .with_detail("session_id", session_id)
            }
            SessionError::InvalidState { session_id, status } => {
                AppError::with_message(ErrorCode::SessionNotActive, message)
                    .with_detail("session_id", session_id)
                    .with_detail("status", status.as_str())
            }
            SessionError::DuplicateOrder { order_id, .. } => {
                AppError::with_message(ErrorCode::OrderAlreadyAttached, message)
                    .with_detail("order_id", order_id)
            }
            SessionError::Conflict(_) => AppError::with_message(ErrorCode::SessionConflict, message),
            SessionError::CleanupInProgress => AppError::new(ErrorCode::CleanupInProgress),
            SessionError::InvalidAmount { kind, .. } => {
                let code = match kind {
                    AmountKind::Order => ErrorCode::OrderInvalidAmount,
                    AmountKind::Payment => ErrorCode::PaymentInvalidAmount,
                };
                AppError::with_message(code, message).with_detail("field", "amount")
            }
            SessionError::Validation(msg) => AppError::validation(msg),
            SessionError::Repo(e) => e.into(),
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

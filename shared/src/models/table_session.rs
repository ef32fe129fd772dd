//! Table Session Model (桌台会话)
//!
//! One continuous period during which a physical table is in use for
//! customer self-ordering. Status only moves forward:
//! `ACTIVE → COMPLETED` (paid) or `ACTIVE → ABANDONED` (reclaimed).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SessionStatus {
    #[default]
    Active,
    /// All orders paid, closed explicitly
    Completed,
    /// Reclaimed after inactivity
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Abandoned => "ABANDONED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque bearer credential handed to the client (cookie)
///
/// `Debug` is redacted so the token never ends up in logs.
#[derive(Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(transparent))]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Anonymous walk-in owner info
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuestInfo {
    /// Client-supplied device fingerprint
    pub device_id: String,
    /// Originating network address
    pub ip_address: Option<String>,
}

/// Who a session belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionOwner {
    /// Logged-in customer
    Customer { customer_id: i64 },
    /// Anonymous guest
    Guest(GuestInfo),
}

/// Table session entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TableSession {
    pub id: i64,
    #[serde(skip)]
    pub session_token: SessionToken,
    pub table_id: i64,
    pub branch_id: i64,
    pub customer_id: Option<i64>,
    pub guest_device_id: Option<String>,
    pub guest_ip: Option<String>,
    /// Orders attached so far, in insertion order
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub order_ids: Vec<String>,
    /// Sum of all attached order amounts
    pub total_amount: f64,
    pub paid_amount: f64,
    pub status: SessionStatus,
    pub started_at: i64,
    pub last_activity_at: i64,
    pub completed_at: Option<i64>,
}

/// Order feed payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOrderAdd {
    pub order_id: String,
    pub amount: f64,
}

/// Payment record payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPaymentAdd {
    pub amount: f64,
}

/// Manual cleanup payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCleanupRequest {
    /// Falls back to the configured threshold
    pub hours_inactive: Option<u64>,
}

/// One session reclaimed by a cleanup run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbandonedSession {
    pub session_id: i64,
    pub table_id: i64,
    pub branch_id: i64,
    pub last_activity_at: i64,
}

impl From<&TableSession> for AbandonedSession {
    fn from(session: &TableSession) -> Self {
        Self {
            session_id: session.id,
            table_id: session.table_id,
            branch_id: session.branch_id,
            last_activity_at: session.last_activity_at,
        }
    }
}

/// Result of a cleanup run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CleanupReport {
    pub cleaned: usize,
    /// Cutoff instant used for the whole run (Unix millis)
    pub cutoff: i64,
    pub sessions: Vec<AbandonedSession>,
}

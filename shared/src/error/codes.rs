//! Unified error codes for the dine framework
//!
//! This module defines all error codes used across dine-server and frontend.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Table session errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Table session ====================
    /// Table session not found
    SessionNotFound = 1101,
    /// Table session is completed or abandoned
    SessionNotActive = 1102,
    /// Concurrent write on a table session lost the race
    SessionConflict = 1103,
    /// Session token missing, stale, or issued for another table
    SessionTokenInvalid = 1104,
    /// A cleanup run is already in progress
    CleanupInProgress = 1105,

    // ==================== 4xxx: Order ====================
    /// Order is already attached to this session
    OrderAlreadyAttached = 4008,
    /// Order amount is negative or not a number
    OrderInvalidAmount = 4009,

    // ==================== 5xxx: Payment ====================
    /// Payment amount is negative or not a number
    PaymentInvalidAmount = 5006,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table is occupied
    TableOccupied = 7002,
    /// Table is not reserved
    TableNotReserved = 7003,
    /// Table is out of service
    TableUnavailable = 7005,
    /// Table is already reserved
    TableAlreadyReserved = 7006,
    /// Table name already exists in the branch
    TableNameExists = 7007,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// System busy (IO error, retry later)
    SystemBusy = 9404,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Table session
            ErrorCode::SessionNotFound => "Table session not found",
            ErrorCode::SessionNotActive => "Table session is no longer active",
            ErrorCode::SessionConflict => "Table session was modified concurrently",
            ErrorCode::SessionTokenInvalid => "Table session token is invalid",
            ErrorCode::CleanupInProgress => "Session cleanup is already running",

            // Order
            ErrorCode::OrderAlreadyAttached => "Order is already attached to this session",
            ErrorCode::OrderInvalidAmount => "Order amount is invalid",

            // Payment
            ErrorCode::PaymentInvalidAmount => "Payment amount is invalid",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableOccupied => "Table is occupied",
            ErrorCode::TableNotReserved => "Table is not reserved",
            ErrorCode::TableUnavailable => "Table is unavailable",
            ErrorCode::TableAlreadyReserved => "Table is already reserved",
            ErrorCode::TableNameExists => "Table name already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::SystemBusy => "System busy, please retry later",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Table session
            1101 => Ok(ErrorCode::SessionNotFound),
            1102 => Ok(ErrorCode::SessionNotActive),
            1103 => Ok(ErrorCode::SessionConflict),
            1104 => Ok(ErrorCode::SessionTokenInvalid),
            1105 => Ok(ErrorCode::CleanupInProgress),

            // Order
            4008 => Ok(ErrorCode::OrderAlreadyAttached),
            4009 => Ok(ErrorCode::OrderInvalidAmount),

            // Payment
            5006 => Ok(ErrorCode::PaymentInvalidAmount),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableOccupied),
            7003 => Ok(ErrorCode::TableNotReserved),
            7005 => Ok(ErrorCode::TableUnavailable),
            7006 => Ok(ErrorCode::TableAlreadyReserved),
            7007 => Ok(ErrorCode::TableNameExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9404 => Ok(ErrorCode::SystemBusy),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

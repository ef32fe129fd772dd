//! Data models
//!
//! Shared between dine-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY, snowflake generated).

pub mod dining_table;
pub mod table_session;

// Re-exports
pub use dining_table::*;
pub use table_session::*;

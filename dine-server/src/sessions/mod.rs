//! Table sessions
//!
//! - [`SessionManager`] - lifecycle, order accumulation, cleanup
//! - [`SessionReclaimScheduler`] - periodic abandoned-session sweep
//! - [`token`] - session token generation and comparison

pub mod error;
pub mod manager;
pub mod reclaim;
pub mod token;

pub use error::{SessionError, SessionResult};
pub use manager::{SessionManager, SessionOutcome};
pub use reclaim::{ReclaimGuard, SessionReclaimScheduler, run_manual_cleanup};

//! Request-time table access policy

pub mod guard;
pub mod identity;

pub use guard::{TableAccess, check_table_access, is_owner, recheck_after_create};
pub use identity::CallerIdentity;

#![allow(dead_code)]

use dine_server::db::repository::dining_table;
use dine_server::{Config, ServerState};
use shared::models::{DiningTable, DiningTableCreate, GuestInfo, SessionOwner};
use tempfile::TempDir;

/// Fresh state over a file-backed database in a temp dir
pub async fn setup() -> (TempDir, ServerState) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_overrides(dir.path().to_str().unwrap(), 0);
    config.session_inactive_hours = 4;
    let state = ServerState::initialize(&config).await.unwrap();
    (dir, state)
}

pub async fn create_table(state: &ServerState, branch_id: i64, name: &str) -> DiningTable {
    dining_table::create(
        &state.pool,
        DiningTableCreate {
            branch_id,
            name: name.to_string(),
            capacity: Some(4),
        },
    )
    .await
    .unwrap()
}

pub fn guest(device: &str) -> SessionOwner {
    SessionOwner::Guest(GuestInfo {
        device_id: device.to_string(),
        ip_address: Some("10.0.0.1".to_string()),
    })
}

/// Backdate a session's last activity
pub async fn set_last_activity(state: &ServerState, session_id: i64, at: i64) {
    sqlx::query("UPDATE table_session SET last_activity_at = ? WHERE id = ?")
        .bind(at)
        .bind(session_id)
        .execute(&state.pool)
        .await
        .unwrap();
}

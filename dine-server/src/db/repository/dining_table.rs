//! Dining Table Repository
//!
//! Availability writes live here but are only called from
//! `tables::occupancy`, the single writer of that column.

use super::{RepoError, RepoResult};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableAvailability};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str =
    "id, branch_id, name, capacity, is_active, availability, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(table)
}

pub async fn find_by_branch(pool: &SqlitePool, branch_id: i64) -> RepoResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {COLUMNS} FROM dining_table WHERE branch_id = ? ORDER BY name"
    ))
    .bind(branch_id)
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    let name = data.name.trim();
    if name.is_empty() {
        return Err(RepoError::Validation("Table name cannot be empty".into()));
    }
    let capacity = data.capacity.unwrap_or(4);
    if capacity <= 0 {
        return Err(RepoError::Validation(format!(
            "Capacity must be positive: {capacity}"
        )));
    }

    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO dining_table (id, branch_id, name, capacity, is_active, availability, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, 1, 'AVAILABLE', ?5, ?5)",
    )
    .bind(id)
    .bind(data.branch_id)
    .bind(name)
    .bind(capacity)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => {
            RepoError::Duplicate(format!("Table '{name}' already exists in this branch"))
        }
        other => other,
    })?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create dining table".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: DiningTableUpdate) -> RepoResult<DiningTable> {
    if let Some(capacity) = data.capacity
        && capacity <= 0
    {
        return Err(RepoError::Validation(format!(
            "Capacity must be positive: {capacity}"
        )));
    }
    if data.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(RepoError::Validation("Table name cannot be empty".into()));
    }
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE dining_table SET name = COALESCE(?1, name), capacity = COALESCE(?2, capacity), is_active = COALESCE(?3, is_active), updated_at = ?4 WHERE id = ?5",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.capacity)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Dining table {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Dining table {id} not found")))
}

/// Current availability, inside the caller's transaction
pub async fn availability(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<TableAvailability>> {
    let availability = sqlx::query_scalar::<_, TableAvailability>(
        "SELECT availability FROM dining_table WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(availability)
}

/// Unconditional availability write. Returns false if the table is missing.
pub async fn set_availability(
    conn: &mut SqliteConnection,
    id: i64,
    availability: TableAvailability,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE dining_table SET availability = ?1, updated_at = ?2 WHERE id = ?3",
    )
    .bind(availability)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Compare-and-set on availability. Returns false when `from` didn't match.
pub async fn transition_availability(
    conn: &mut SqliteConnection,
    id: i64,
    from: TableAvailability,
    to: TableAvailability,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE dining_table SET availability = ?1, updated_at = ?2 WHERE id = ?3 AND availability = ?4",
    )
    .bind(to)
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Claim a free, in-service table for a reservation.
///
/// Refuses when an ACTIVE session holds the table, in the same statement.
pub async fn reserve_if_free(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE dining_table SET availability = 'RESERVED', updated_at = ?1 \
         WHERE id = ?2 AND is_active = 1 AND availability = 'AVAILABLE' \
         AND NOT EXISTS (SELECT 1 FROM table_session WHERE table_id = ?2 AND status = 'ACTIVE')",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

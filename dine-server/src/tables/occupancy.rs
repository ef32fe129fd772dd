//! Table occupancy
//!
//! Single writer of `dining_table.availability`. Session lifecycle calls
//! the `*_for_session` functions inside its own transaction; reservation
//! claims go through [`reserve`] / [`release_reservation`].

use shared::error::{AppError, ErrorCode};
use shared::models::{DiningTable, TableAvailability};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

use crate::db::repository::{RepoError, RepoResult, dining_table, table_session};

/// Reservation claim failures
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("Table {0} is missing or out of service")]
    Unavailable(i64),

    #[error("Table {table_id} is occupied")]
    Occupied { table_id: i64, started_at: Option<i64> },

    #[error("Table {0} is already reserved")]
    AlreadyReserved(i64),

    #[error("Table {0} is not reserved")]
    NotReserved(i64),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<ReservationError> for AppError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::Unavailable(id) => AppError::table_unavailable(id),
            ReservationError::Occupied {
                table_id,
                started_at: Some(started_at),
            } => AppError::table_occupied(table_id, started_at, false),
            ReservationError::Occupied { table_id, .. } => {
                AppError::new(ErrorCode::TableOccupied).with_detail("table_id", table_id)
            }
            ReservationError::AlreadyReserved(id) => {
                AppError::new(ErrorCode::TableAlreadyReserved).with_detail("table_id", id)
            }
            ReservationError::NotReserved(id) => {
                AppError::new(ErrorCode::TableNotReserved).with_detail("table_id", id)
            }
            ReservationError::Repo(e) => e.into(),
        }
    }
}

/// Mark a table OCCUPIED for a session just created in `conn`'s transaction.
///
/// Overrides a RESERVED mark; the guard does not consult reservations.
pub async fn occupy_for_session(conn: &mut SqliteConnection, table_id: i64) -> RepoResult<()> {
    match dining_table::availability(&mut *conn, table_id).await? {
        None => {
            return Err(RepoError::NotFound(format!(
                "Dining table {table_id} not found"
            )));
        }
        Some(TableAvailability::Reserved) => {
            tracing::warn!(table_id, "Session opened on a reserved table, reservation overridden");
        }
        Some(_) => {}
    }
    dining_table::set_availability(conn, table_id, TableAvailability::Occupied).await?;
    Ok(())
}

/// OCCUPIED → AVAILABLE when a session ends. Other states are left alone.
pub async fn release_from_session(conn: &mut SqliteConnection, table_id: i64) -> RepoResult<()> {
    let released = dining_table::transition_availability(
        conn,
        table_id,
        TableAvailability::Occupied,
        TableAvailability::Available,
    )
    .await?;
    if !released {
        tracing::debug!(table_id, "Table was not marked occupied, nothing to release");
    }
    Ok(())
}

/// AVAILABLE → RESERVED, refused while a session holds the table
pub async fn reserve(pool: &SqlitePool, table_id: i64) -> Result<DiningTable, ReservationError> {
    if dining_table::reserve_if_free(pool, table_id).await? {
        tracing::info!(table_id, "Table reserved");
        return dining_table::find_by_id(pool, table_id)
            .await?
            .ok_or(ReservationError::Unavailable(table_id));
    }

    let table = dining_table::find_by_id(pool, table_id)
        .await?
        .filter(|t| t.is_active)
        .ok_or(ReservationError::Unavailable(table_id))?;

    if let Some(session) = table_session::find_active_for_table(pool, table_id).await? {
        return Err(ReservationError::Occupied {
            table_id,
            started_at: Some(session.started_at),
        });
    }
    match table.availability {
        TableAvailability::Occupied => Err(ReservationError::Occupied {
            table_id,
            started_at: None,
        }),
        // Reserved, or a session closed between the claim and this read
        _ => Err(ReservationError::AlreadyReserved(table_id)),
    }
}

/// RESERVED → AVAILABLE
pub async fn release_reservation(
    pool: &SqlitePool,
    table_id: i64,
) -> Result<DiningTable, ReservationError> {
    let mut conn = pool.acquire().await.map_err(RepoError::from)?;
    let released = dining_table::transition_availability(
        &mut conn,
        table_id,
        TableAvailability::Reserved,
        TableAvailability::Available,
    )
    .await?;
    drop(conn);

    let table = dining_table::find_by_id(pool, table_id)
        .await?
        .ok_or(ReservationError::Unavailable(table_id))?;
    if !released {
        return Err(ReservationError::NotReserved(table_id));
    }
    tracing::info!(table_id, "Reservation released");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::{DiningTableCreate, DiningTableUpdate};

    async fn setup() -> (tempfile::TempDir, SqlitePool, i64) {
        let dir = tempfile::tempdir().unwrap();
        let db = DbService::new(dir.path().join("t.db").to_str().unwrap())
            .await
            .unwrap();
        let table = dining_table::create(
            &db.pool,
            DiningTableCreate {
                branch_id: 1,
                name: "A1".into(),
                capacity: Some(2),
            },
        )
        .await
        .unwrap();
        (dir, db.pool, table.id)
    }

    #[tokio::test]
    async fn test_reserve_and_release() {
        let (_dir, pool, id) = setup().await;

        let table = reserve(&pool, id).await.unwrap();
        assert_eq!(table.availability, TableAvailability::Reserved);

        let err = reserve(&pool, id).await.unwrap_err();
        assert!(matches!(err, ReservationError::AlreadyReserved(_)));

        let table = release_reservation(&pool, id).await.unwrap();
        assert_eq!(table.availability, TableAvailability::Available);

        let err = release_reservation(&pool, id).await.unwrap_err();
        assert!(matches!(err, ReservationError::NotReserved(_)));
    }

    #[tokio::test]
    async fn test_reserve_inactive_table_is_unavailable() {
        let (_dir, pool, id) = setup().await;
        dining_table::update(
            &pool,
            id,
            DiningTableUpdate {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = reserve(&pool, id).await.unwrap_err();
        assert!(matches!(err, ReservationError::Unavailable(_)));
        let err = reserve(&pool, id + 1).await.unwrap_err();
        assert!(matches!(err, ReservationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_occupy_then_release() {
        let (_dir, pool, id) = setup().await;
        let mut conn = pool.acquire().await.unwrap();

        occupy_for_session(&mut conn, id).await.unwrap();
        let table = dining_table::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(table.availability, TableAvailability::Occupied);

        release_from_session(&mut conn, id).await.unwrap();
        let table = dining_table::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(table.availability, TableAvailability::Available);

        assert!(occupy_for_session(&mut conn, id + 1).await.is_err());
    }

    #[tokio::test]
    async fn test_release_from_session_keeps_reservation() {
        let (_dir, pool, id) = setup().await;
        reserve(&pool, id).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        release_from_session(&mut conn, id).await.unwrap();
        let table = dining_table::find_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(table.availability, TableAvailability::Reserved);
    }
}

//! Table Session Repository
//!
//! Every status change carries `WHERE status = 'ACTIVE'`, so a terminal
//! session can never be reopened or double-closed. Amount updates are
//! increments in SQL, never read-modify-write in Rust.

use super::RepoResult;
use shared::models::{SessionStatus, SessionToken, TableSession};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

const COLUMNS: &str = "id, session_token, table_id, branch_id, customer_id, guest_device_id, guest_ip, total_amount, paid_amount, status, started_at, last_activity_at, completed_at";

/// Insert parameters for a fresh session
#[derive(Debug, Clone)]
pub struct NewTableSession {
    pub id: i64,
    pub session_token: SessionToken,
    pub table_id: i64,
    pub branch_id: i64,
    pub customer_id: Option<i64>,
    pub guest_device_id: Option<String>,
    pub guest_ip: Option<String>,
    pub now: i64,
}

// ── Reads ──────────────────────────────────────────────────────────

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<TableSession>> {
    let session = sqlx::query_as::<_, TableSession>(&format!(
        "SELECT {COLUMNS} FROM table_session WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    with_orders(pool, session).await
}

pub async fn find_active_for_table(
    pool: &SqlitePool,
    table_id: i64,
) -> RepoResult<Option<TableSession>> {
    let session = sqlx::query_as::<_, TableSession>(&format!(
        "SELECT {COLUMNS} FROM table_session WHERE table_id = ? AND status = 'ACTIVE'"
    ))
    .bind(table_id)
    .fetch_optional(pool)
    .await?;
    with_orders(pool, session).await
}

pub async fn find_active_by_branch(
    pool: &SqlitePool,
    branch_id: i64,
) -> RepoResult<Vec<TableSession>> {
    let mut sessions = sqlx::query_as::<_, TableSession>(&format!(
        "SELECT {COLUMNS} FROM table_session WHERE branch_id = ? AND status = 'ACTIVE' ORDER BY started_at"
    ))
    .bind(branch_id)
    .fetch_all(pool)
    .await?;
    for session in &mut sessions {
        session.order_ids = order_ids(pool, session.id).await?;
    }
    Ok(sessions)
}

pub async fn status_of<'e>(
    executor: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<SessionStatus>> {
    let status = sqlx::query_scalar::<_, SessionStatus>(
        "SELECT status FROM table_session WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(status)
}

/// Attached order ids in insertion order
pub async fn order_ids<'e>(
    executor: impl SqliteExecutor<'e>,
    session_id: i64,
) -> RepoResult<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT order_id FROM table_session_order WHERE session_id = ? ORDER BY rowid",
    )
    .bind(session_id)
    .fetch_all(executor)
    .await?;
    Ok(ids)
}

async fn with_orders(
    pool: &SqlitePool,
    session: Option<TableSession>,
) -> RepoResult<Option<TableSession>> {
    match session {
        Some(mut session) => {
            session.order_ids = order_ids(pool, session.id).await?;
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

// ── Writes ─────────────────────────────────────────────────────────

/// Refresh the active session of a table, if any
pub async fn touch_active_for_table(
    conn: &mut SqliteConnection,
    table_id: i64,
    now: i64,
) -> RepoResult<Option<TableSession>> {
    let session = sqlx::query_as::<_, TableSession>(&format!(
        "UPDATE table_session SET last_activity_at = ?1 WHERE table_id = ?2 AND status = 'ACTIVE' RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(table_id)
    .fetch_optional(&mut *conn)
    .await?;
    match session {
        Some(mut session) => {
            session.order_ids = order_ids(&mut *conn, session.id).await?;
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

/// Bump `last_activity_at`. Returns false unless the session is ACTIVE.
pub async fn touch(pool: &SqlitePool, id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE table_session SET last_activity_at = ?1 WHERE id = ?2 AND status = 'ACTIVE'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

/// Insert a new ACTIVE session, gated on the table existing in the
/// branch and being in service.
///
/// Returns `None` when the gate fails. A second ACTIVE session for the
/// same table fails with `RepoError::Duplicate` (partial unique index).
pub async fn insert(
    conn: &mut SqliteConnection,
    new: &NewTableSession,
) -> RepoResult<Option<TableSession>> {
    let session = sqlx::query_as::<_, TableSession>(&format!(
        "INSERT INTO table_session (id, session_token, table_id, branch_id, customer_id, guest_device_id, guest_ip, total_amount, paid_amount, status, started_at, last_activity_at) \
         SELECT ?1, ?2, id, branch_id, ?3, ?4, ?5, 0, 0, 'ACTIVE', ?6, ?6 FROM dining_table \
         WHERE id = ?7 AND branch_id = ?8 AND is_active = 1 \
         RETURNING {COLUMNS}"
    ))
    .bind(new.id)
    .bind(&new.session_token)
    .bind(new.customer_id)
    .bind(&new.guest_device_id)
    .bind(&new.guest_ip)
    .bind(new.now)
    .bind(new.table_id)
    .bind(new.branch_id)
    .fetch_optional(conn)
    .await?;
    Ok(session)
}

/// Increment `total_amount` on an ACTIVE session and record the order.
///
/// Must run inside a transaction: a duplicate order id fails on the
/// insert and the caller's rollback undoes the increment.
pub async fn add_order(
    conn: &mut SqliteConnection,
    session_id: i64,
    order_id: &str,
    amount: f64,
    now: i64,
) -> RepoResult<Option<TableSession>> {
    let session = sqlx::query_as::<_, TableSession>(&format!(
        "UPDATE table_session SET total_amount = total_amount + ?1, last_activity_at = ?2 \
         WHERE id = ?3 AND status = 'ACTIVE' RETURNING {COLUMNS}"
    ))
    .bind(amount)
    .bind(now)
    .bind(session_id)
    .fetch_optional(&mut *conn)
    .await?;
    let Some(mut session) = session else {
        return Ok(None);
    };

    sqlx::query(
        "INSERT INTO table_session_order (session_id, order_id, amount, added_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(session_id)
    .bind(order_id)
    .bind(amount)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    session.order_ids = order_ids(&mut *conn, session_id).await?;
    Ok(Some(session))
}

/// Increment `paid_amount` on an ACTIVE session
pub async fn add_payment(
    conn: &mut SqliteConnection,
    session_id: i64,
    amount: f64,
    now: i64,
) -> RepoResult<Option<TableSession>> {
    let session = sqlx::query_as::<_, TableSession>(&format!(
        "UPDATE table_session SET paid_amount = paid_amount + ?1, last_activity_at = ?2 \
         WHERE id = ?3 AND status = 'ACTIVE' RETURNING {COLUMNS}"
    ))
    .bind(amount)
    .bind(now)
    .bind(session_id)
    .fetch_optional(&mut *conn)
    .await?;
    match session {
        Some(mut session) => {
            session.order_ids = order_ids(&mut *conn, session_id).await?;
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

/// ACTIVE → COMPLETED
pub async fn complete(
    conn: &mut SqliteConnection,
    session_id: i64,
    now: i64,
) -> RepoResult<Option<TableSession>> {
    let session = sqlx::query_as::<_, TableSession>(&format!(
        "UPDATE table_session SET status = 'COMPLETED', completed_at = ?1, last_activity_at = ?1 \
         WHERE id = ?2 AND status = 'ACTIVE' RETURNING {COLUMNS}"
    ))
    .bind(now)
    .bind(session_id)
    .fetch_optional(&mut *conn)
    .await?;
    match session {
        Some(mut session) => {
            session.order_ids = order_ids(&mut *conn, session_id).await?;
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

/// ACTIVE → ABANDONED for every session idle since `cutoff` (inclusive)
pub async fn abandon_stale(
    conn: &mut SqliteConnection,
    cutoff: i64,
) -> RepoResult<Vec<TableSession>> {
    let sessions = sqlx::query_as::<_, TableSession>(&format!(
        "UPDATE table_session SET status = 'ABANDONED' \
         WHERE status = 'ACTIVE' AND last_activity_at <= ?1 RETURNING {COLUMNS}"
    ))
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::{RepoError, dining_table};
    use shared::models::DiningTableCreate;

    async fn setup() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = DbService::new(path.to_str().unwrap()).await.unwrap();
        (dir, db.pool)
    }

    async fn table(pool: &SqlitePool, branch_id: i64, name: &str) -> i64 {
        dining_table::create(
            pool,
            DiningTableCreate {
                branch_id,
                name: name.to_string(),
                capacity: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn new_session(table_id: i64, branch_id: i64, now: i64) -> NewTableSession {
        NewTableSession {
            id: shared::util::snowflake_id(),
            session_token: SessionToken::new("tok"),
            table_id,
            branch_id,
            customer_id: None,
            guest_device_id: Some("dev".into()),
            guest_ip: None,
            now,
        }
    }

    #[tokio::test]
    async fn test_insert_gated_on_branch_and_active() {
        let (_dir, pool) = setup().await;
        let t = table(&pool, 1, "T1").await;

        let mut conn = pool.acquire().await.unwrap();
        // Wrong branch
        assert!(insert(&mut conn, &new_session(t, 2, 10)).await.unwrap().is_none());
        // Missing table
        assert!(insert(&mut conn, &new_session(t + 1, 1, 10)).await.unwrap().is_none());

        let s = insert(&mut conn, &new_session(t, 1, 10)).await.unwrap().unwrap();
        assert_eq!(s.status, SessionStatus::Active);
        assert_eq!(s.total_amount, 0.0);
        assert_eq!(s.started_at, 10);
    }

    #[tokio::test]
    async fn test_second_active_insert_is_duplicate() {
        let (_dir, pool) = setup().await;
        let t = table(&pool, 1, "T1").await;
        let mut conn = pool.acquire().await.unwrap();

        insert(&mut conn, &new_session(t, 1, 10)).await.unwrap().unwrap();
        let err = insert(&mut conn, &new_session(t, 1, 11)).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_abandon_stale_is_inclusive() {
        let (_dir, pool) = setup().await;
        let t1 = table(&pool, 1, "T1").await;
        let t2 = table(&pool, 1, "T2").await;
        let mut conn = pool.acquire().await.unwrap();

        insert(&mut conn, &new_session(t1, 1, 1_000)).await.unwrap().unwrap();
        insert(&mut conn, &new_session(t2, 1, 1_001)).await.unwrap().unwrap();

        let abandoned = abandon_stale(&mut conn, 1_000).await.unwrap();
        assert_eq!(abandoned.len(), 1);
        assert_eq!(abandoned[0].table_id, t1);
        assert_eq!(abandoned[0].status, SessionStatus::Abandoned);

        // Already abandoned, nothing left at this cutoff
        assert!(abandon_stale(&mut conn, 1_000).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_terminal_sessions_reject_writes() {
        let (_dir, pool) = setup().await;
        let t = table(&pool, 1, "T1").await;
        let mut conn = pool.acquire().await.unwrap();
        let s = insert(&mut conn, &new_session(t, 1, 10)).await.unwrap().unwrap();

        assert!(complete(&mut conn, s.id, 20).await.unwrap().is_some());
        assert!(complete(&mut conn, s.id, 30).await.unwrap().is_none());
        assert!(add_order(&mut conn, s.id, "o1", 5.0, 30).await.unwrap().is_none());
        assert!(add_payment(&mut conn, s.id, 5.0, 30).await.unwrap().is_none());
        assert!(!touch(&pool, s.id, 30).await.unwrap());

        let stored = find_by_id(&pool, s.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert_eq!(stored.completed_at, Some(20));
        assert_eq!(stored.total_amount, 0.0);
    }

    #[tokio::test]
    async fn test_order_ids_keep_insertion_order() {
        let (_dir, pool) = setup().await;
        let t = table(&pool, 1, "T1").await;
        let mut conn = pool.acquire().await.unwrap();
        let s = insert(&mut conn, &new_session(t, 1, 10)).await.unwrap().unwrap();

        add_order(&mut conn, s.id, "zeta", 1.0, 11).await.unwrap();
        add_order(&mut conn, s.id, "alpha", 2.0, 12).await.unwrap();
        let s = add_order(&mut conn, s.id, "mid", 3.0, 13).await.unwrap().unwrap();

        assert_eq!(s.order_ids, vec!["zeta", "alpha", "mid"]);
        assert_eq!(s.total_amount, 6.0);
        assert_eq!(s.last_activity_at, 13);
    }
}

//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::{RepoError, dining_table};
use crate::tables::occupancy;
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub branch_id: i64,
}

fn table_error(id: i64, err: RepoError) -> AppError {
    match err {
        RepoError::NotFound(_) => {
            AppError::new(ErrorCode::TableNotFound).with_detail("table_id", id)
        }
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::TableNameExists, msg),
        other => other.into(),
    }
}

/// GET /api/tables?branch_id= - 获取门店所有桌台
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DiningTable>>> {
    let tables = dining_table::find_by_branch(&state.pool, query.branch_id).await?;
    Ok(Json(tables))
}

/// GET /api/tables/{id} - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::TableNotFound).with_detail("table_id", id))?;
    Ok(Json(table))
}

/// POST /api/tables - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::create(&state.pool, payload)
        .await
        .map_err(|e| table_error(0, e))?;
    tracing::info!(table_id = table.id, branch_id = table.branch_id, name = %table.name, "Dining table created");
    Ok(Json(table))
}

/// PUT /api/tables/{id} - 更新桌台 (名称、容量、是否启用)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    let table = dining_table::update(&state.pool, id, payload)
        .await
        .map_err(|e| table_error(id, e))?;
    Ok(Json(table))
}

/// POST /api/tables/{id}/reserve - 预订桌台
pub async fn reserve(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    Ok(Json(occupancy::reserve(&state.pool, id).await?))
}

/// POST /api/tables/{id}/release - 取消预订
pub async fn release(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DiningTable>> {
    Ok(Json(occupancy::release_reservation(&state.pool, id).await?))
}

use std::path::Path;

use sqlx::SqlitePool;

use crate::core::tasks::BackgroundTasks;
use crate::core::{Config, Result, ServerError};
use crate::db::DbService;
use crate::sessions::{ReclaimGuard, SessionManager, SessionReclaimScheduler};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 所有字段都是廉价 Clone (内部为 Arc)。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | sessions | SessionManager | 桌台会话管理 |
/// | reclaim_guard | ReclaimGuard | 会话回收互斥标记 (定时/手动共享) |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub sessions: SessionManager,
    pub reclaim_guard: ReclaimGuard,
}

impl ServerState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        Self {
            config,
            sessions: SessionManager::new(pool.clone()),
            pool,
            reclaim_guard: ReclaimGuard::new(),
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 确保数据库目录存在
    /// 2. 打开数据库并执行迁移
    pub async fn initialize(config: &Config) -> Result<Self> {
        if let Some(parent) = Path::new(&config.database_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = DbService::new(&config.database_path).await?;
        tracing::info!(path = %config.database_path, "Database ready");

        Ok(Self::new(config.clone(), db.pool))
    }

    /// 启动后台任务
    ///
    /// - 会话回收调度器 (启动时立即执行一次，之后按间隔执行)
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let scheduler = SessionReclaimScheduler::new(
            self.sessions.clone(),
            self.reclaim_guard.clone(),
            self.config.session_inactive_hours,
            self.config.session_cleanup_interval(),
            tasks.shutdown_token(),
        );
        tasks.spawn("session_reclaim", scheduler.run());

        tracing::info!("Background tasks registered: {}", tasks.len());
        tasks
    }

    pub fn check_config(config: &Config) -> Result<()> {
        if config.database_path.trim().is_empty() {
            return Err(ServerError::Config("DATABASE_PATH is empty".into()));
        }
        Ok(())
    }
}

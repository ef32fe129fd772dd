//! Dine Server - 顾客扫码点餐的桌台会话服务
//!
//! # 模块结构
//!
//! ```text
//! dine-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── db/            # SQLite 连接池与仓储
//! ├── tables/        # 桌台占用仲裁 (会话 / 预订)
//! ├── sessions/      # 会话生命周期、令牌、闲置回收
//! ├── access/        # 请求级桌台访问判定
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、错误类型
//! ```

pub mod access;
pub mod api;
pub mod core;
pub mod db;
pub mod sessions;
pub mod tables;
pub mod utils;

pub use crate::core::{Config, Server, ServerState};
pub use sessions::{SessionError, SessionManager};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: 加载 .env，初始化日志
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在时忽略
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    let json = std::env::var("LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    init_logger_with_file(log_level.as_deref(), json, log_dir.as_deref());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ____  _
  / __ \(_)___  ___
 / / / / / __ \/ _ \
/ /_/ / / / / /  __/
\____/_/_/ /_/\___/ server
    "#
    );
}

use dine_server::{Config, Server, print_banner, setup_environment};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 设置环境 (dotenv, 日志)
    setup_environment()?;

    print_banner();

    tracing::info!("🦀 Dine Server starting...");

    // 2. 加载配置
    let config = Config::from_env();
    tracing::info!(
        environment = %config.environment,
        http_port = config.http_port,
        session_inactive_hours = config.session_inactive_hours,
        cleanup_interval_secs = config.session_cleanup_interval_secs,
        "Configuration loaded"
    );

    // 3. 启动服务器 (初始化状态、后台任务、HTTP)
    let server = Server::new(config);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

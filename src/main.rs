use anyhow::Context;
use attachment_store::{StorageFacade, app, config::AppConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载 .env 文件
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_timer(LocalTime::rfc_3339())
        .init();

    let app_config = AppConfig::from_env().context("读取服务设置失败")?;
    let storage_config = app_config.load_storage_config().with_context(|| {
        format!(
            "加载存储配置失败：{}（环境 {}）",
            app_config.storage_config_path.display(),
            app_config.environment
        )
    })?;

    info!(
        environment = %app_config.environment,
        bucket = storage_config.bucket(),
        folder = storage_config.folder(),
        private = storage_config.is_private(),
        proxy = storage_config.proxy(),
        "存储配置已加载"
    );

    let storage = Arc::new(StorageFacade::connect_lazy(storage_config));
    if app_config.ensure_bucket {
        storage
            .ensure_bucket()
            .await
            .context("检查存储桶失败")?;
    }

    let listener = tokio::net::TcpListener::bind(&app_config.bind_addr)
        .await
        .with_context(|| format!("无法监听 {}", app_config.bind_addr))?;

    info!("服务器运行在 http://{}", app_config.bind_addr);

    axum::serve(listener, app(storage))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "无法监听退出信号");
        std::future::pending::<()>().await;
    }
    info!("收到退出信号，正在关闭服务");
}

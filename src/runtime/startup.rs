use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::storage;
use crate::system::init_logging;

/// 服务器启动所需的全部上下文
pub struct StartupContext {
    pub state: AppState,
    pub db: DatabaseConnection,
    /// 日志写入线程的 guard，进程结束前不能释放
    pub log_guard: WorkerGuard,
}

/// 读取 `.env` 与配置文件
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("Warning: failed to read .env: {}", e);
    }
    AppConfig::load(config_path).context("Failed to load configuration")
}

/// 准备服务器启动的上下文
pub async fn prepare_server_startup(config_path: Option<&str>) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    let config = load_config(config_path)?;
    let log_guard = init_logging(&config.logging).context("Failed to initialize logging")?;
    debug!("Starting pre-startup processing...");

    if config.site.public_domain.is_empty() {
        warn!("site.public_domain is empty; canonical URLs will be incomplete");
    }

    let db = storage::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    let state = AppState::bootstrap(config, db.clone())
        .await
        .context("Failed to initialize application state")?;

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        state,
        db,
        log_guard,
    })
}

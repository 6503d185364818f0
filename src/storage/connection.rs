use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::errors::{LinkhubError, Result};
use migration::{Migrator, MigratorTrait};

/// 数据库类型（从 URL scheme 推断）
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum BackendKind {
    Sqlite,
    Mysql,
    Postgres,
}

/// 从 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<BackendKind> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok(BackendKind::Sqlite)
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok(BackendKind::Mysql)
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://")
    {
        Ok(BackendKind::Postgres)
    } else {
        Err(LinkhubError::database_config(format!(
            "Cannot infer database type from URL: {}. Supported: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 连接 SQLite 数据库（带自动创建和 WAL）
pub async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
    use sea_orm::SqlxSqliteConnector;
    use sea_orm::sqlx::SqlitePool;
    use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
    use std::str::FromStr;

    let opt = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| LinkhubError::database_config(format!("Invalid SQLite URL: {}", e)))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .pragma("temp_store", "memory");

    let pool = SqlitePool::connect_with(opt).await.map_err(|e| {
        LinkhubError::database_connection(format!("Failed to connect to SQLite: {}", e))
    })?;

    Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
}

/// 连接通用数据库（MySQL/PostgreSQL）
pub async fn connect_generic(
    database_url: &str,
    backend: BackendKind,
    pool_size: u32,
    timeout_secs: u64,
) -> Result<DatabaseConnection> {
    // mariadb:// 由 sqlx 的 mysql 驱动处理
    let url = match database_url.strip_prefix("mariadb://") {
        Some(rest) => format!("mysql://{}", rest),
        None => database_url.to_owned(),
    };

    let mut opt = ConnectOptions::new(url);
    opt.max_connections(pool_size.max(1))
        .min_connections(pool_size.clamp(1, 5))
        .connect_timeout(Duration::from_secs(timeout_secs))
        .acquire_timeout(Duration::from_secs(timeout_secs))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(3600))
        .sqlx_logging(false);

    Database::connect(opt).await.map_err(|e| {
        LinkhubError::database_connection(format!(
            "Failed to connect to {} database: {}",
            backend.as_ref().to_uppercase(),
            e
        ))
    })
}

/// 运行数据库迁移
pub async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None)
        .await
        .map_err(|e| LinkhubError::database_operation(format!("Migration failed: {}", e)))?;

    info!("Database migrations completed");
    Ok(())
}

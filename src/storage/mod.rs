use sea_orm::DatabaseConnection;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod connection;
pub mod seed;

pub use connection::{BackendKind, infer_backend_from_url, run_migrations};

/// 打开数据库连接并执行迁移
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection> {
    let database_url = config.resolved_url()?;
    let backend = infer_backend_from_url(&database_url)?;

    let db = match backend {
        BackendKind::Sqlite => connection::connect_sqlite(&database_url).await?,
        _ => {
            connection::connect_generic(
                &database_url,
                backend,
                config.pool_size,
                config.connect_timeout_secs,
            )
            .await?
        }
    };

    run_migrations(&db).await?;
    info!("{} storage initialized", backend.as_ref().to_uppercase());
    Ok(db)
}

//! 启动时的数据初始化
//!
//! 所有步骤都是幂等的，每次启动都会执行。

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::repository::{CounterRepository, SessionStore, SettingsStore};
use crate::services::{AdminBootstrap, AuthService};

pub async fn seed_all(
    config: &AppConfig,
    settings: &SettingsStore,
    counters: &CounterRepository,
    auth: &AuthService,
    sessions: &dyn SessionStore,
) -> Result<()> {
    let inserted = settings.seed_defaults(&config.site.public_domain).await?;
    if inserted > 0 {
        info!("Seeded {} default settings", inserted);
    }

    counters.seed().await?;

    match auth
        .ensure_admin(&config.admin.username, &config.admin.password)
        .await?
    {
        AdminBootstrap::AlreadyExists => {}
        AdminBootstrap::Created => {
            info!("Created admin user '{}'", config.admin.username);
        }
        AdminBootstrap::CreatedWithGeneratedPassword(password) => {
            warn!(
                "Created admin user '{}' with generated password: {}",
                config.admin.username, password
            );
            warn!("Change it with `linkhub reset-password --username {}`", config.admin.username);
        }
    }

    let purged = sessions.purge_expired().await?;
    if purged > 0 {
        info!("Purged {} expired sessions", purged);
    }

    Ok(())
}

//! 应用共享状态
//!
//! 通过 `web::Data<AppState>` 注入到 handler 与中间件。

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::api::render::Renderer;
use crate::api::session_token::SessionTokenService;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::repository::{
    CounterRepository, EmbedRepository, LinkRepository, RedirectRepository, SeaOrmSessionStore,
    SessionStore, SettingsStore, UserRepository,
};
use crate::services::{AuthService, RedirectService, UploadService};
use crate::storage::seed::seed_all;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub settings: SettingsStore,
    pub links: LinkRepository,
    pub embeds: EmbedRepository,
    pub redirects: RedirectService,
    pub counters: CounterRepository,
    pub auth: AuthService,
    pub sessions: Arc<dyn SessionStore>,
    pub tokens: Arc<SessionTokenService>,
    pub renderer: Arc<Renderer>,
    pub uploads: UploadService,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Result<Self> {
        let sessions: Arc<dyn SessionStore> = Arc::new(SeaOrmSessionStore::new(db.clone()));
        let auth = AuthService::new(
            UserRepository::new(db.clone()),
            sessions.clone(),
            config.session.ttl_days,
            config.admin.password_hash_cost,
        );

        Ok(Self {
            settings: SettingsStore::new(db.clone()),
            links: LinkRepository::new(db.clone()),
            embeds: EmbedRepository::new(db.clone()),
            redirects: RedirectService::new(RedirectRepository::new(db.clone())),
            counters: CounterRepository::new(db),
            auth,
            sessions,
            tokens: Arc::new(SessionTokenService::from_config(&config.session)),
            renderer: Arc::new(Renderer::new()?),
            uploads: UploadService::new(&config.server.static_dir, config.uploads.max_bytes),
            config: Arc::new(config),
        })
    }

    /// 构建状态并执行幂等的初始化（默认设置、计数器、管理员账户）
    pub async fn bootstrap(config: AppConfig, db: DatabaseConnection) -> Result<Self> {
        let state = Self::new(config, db)?;
        seed_all(
            &state.config,
            &state.settings,
            &state.counters,
            &state.auth,
            state.sessions.as_ref(),
        )
        .await?;
        Ok(state)
    }

    pub fn trusted_proxies(&self) -> &[String] {
        &self.config.server.trusted_proxies
    }
}

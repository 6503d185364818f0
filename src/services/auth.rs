//! 管理员认证
//!
//! 登录成功时总是创建新会话（旧会话被销毁），不会复用请求中已有的会话 id。

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};

use crate::errors::{LinkhubError, Result};
use crate::repository::{SessionData, SessionStore, User, UserRepository};
use crate::utils::generate_random_code;
use crate::utils::password::{hash_password, is_argon2_hash, verify_password};

/// 首次启动时管理员账户的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminBootstrap {
    AlreadyExists,
    Created,
    /// Created with a generated password that must be shown to the operator once.
    CreatedWithGeneratedPassword(String),
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: Arc<dyn SessionStore>,
    session_ttl: Duration,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(
        users: UserRepository,
        sessions: Arc<dyn SessionStore>,
        session_ttl_days: u64,
        hash_cost: u32,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl: Duration::days(session_ttl_days as i64),
            hash_cost,
        }
    }

    /// 校验用户名密码；成功时销毁旧会话并签发新会话
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        previous_session: Option<&str>,
    ) -> Result<Option<SessionData>> {
        let username = username.trim();
        let Some(user) = self.users.find_by_username(username).await? else {
            info!("Login failed: unknown user '{}'", username);
            return Ok(None);
        };

        if !self.verify(&user, password).await? {
            info!("Login failed: bad password for '{}'", username);
            return Ok(None);
        }

        if let Some(old) = previous_session {
            self.sessions.destroy(old).await?;
        }
        let session = self.sessions.create(user.id, self.session_ttl).await?;
        info!("Admin '{}' logged in", user.username);
        Ok(Some(session))
    }

    async fn verify(&self, user: &User, password: &str) -> Result<bool> {
        if !is_argon2_hash(&user.password_hash) {
            warn!(
                "Stored password hash for '{}' is not Argon2; run `linkhub reset-password`",
                user.username
            );
            return Ok(false);
        }

        let password = password.to_string();
        let hash = user.password_hash.clone();

        // Argon2 是 CPU 密集操作，放到阻塞线程池
        let outcome = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| LinkhubError::session(format!("Password check aborted: {}", e)))?;

        match outcome {
            Ok(valid) => Ok(valid),
            Err(e) => {
                warn!("Stored password hash for '{}' is unusable: {}", user.username, e);
                Ok(false)
            }
        }
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.sessions.destroy(session_id).await
    }

    pub async fn current_session(&self, session_id: &str) -> Result<Option<SessionData>> {
        self.sessions.load(session_id).await
    }

    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let cost = self.hash_cost;
        let hashed = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| LinkhubError::session(format!("Password hashing aborted: {}", e)))??;
        Ok(hashed)
    }

    /// 确保管理员账户存在
    ///
    /// 密码为空时生成随机密码并通过返回值交给调用方展示。
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<AdminBootstrap> {
        if self.users.find_by_username(username).await?.is_some() {
            return Ok(AdminBootstrap::AlreadyExists);
        }

        if password.is_empty() {
            let generated = generate_random_code(16);
            let hashed = self.hash(&generated).await?;
            self.users.create(username, &hashed).await?;
            return Ok(AdminBootstrap::CreatedWithGeneratedPassword(generated));
        }

        let hashed = self.hash(password).await?;
        self.users.create(username, &hashed).await?;
        Ok(AdminBootstrap::Created)
    }

    /// 重置密码；用户不存在时创建。返回 `true` 表示新建了用户。
    pub async fn reset_password(&self, username: &str, password: &str) -> Result<bool> {
        if password.is_empty() {
            return Err(LinkhubError::validation("Password must not be empty"));
        }
        let hashed = self.hash(password).await?;

        match self.users.find_by_username(username).await? {
            Some(user) => {
                self.users.update_password_hash(user.id, &hashed).await?;
                Ok(false)
            }
            None => {
                self.users.create(username, &hashed).await?;
                Ok(true)
            }
        }
    }
}

//! 管理员会话存储
//!
//! `SessionStore` 是会话后端的抽象；默认实现把会话保存在同一个数据库里。

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::debug;

use crate::errors::{LinkhubError, Result};
use crate::utils::generate_secure_token;
use migration::entities::session;

/// 已认证会话
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub id: String,
    pub user_id: i32,
    pub csrf_token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<session::Model> for SessionData {
    fn from(model: session::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            csrf_token: model.csrf_token,
            expires_at: model.expires_at,
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a fresh session with new id and CSRF token.
    async fn create(&self, user_id: i32, ttl: Duration) -> Result<SessionData>;

    /// Load a live session. Expired sessions are removed and reported as absent.
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>>;

    async fn destroy(&self, session_id: &str) -> Result<()>;

    /// Remove every expired session, returning how many were deleted.
    async fn purge_expired(&self) -> Result<u64>;
}

#[derive(Clone)]
pub struct SeaOrmSessionStore {
    db: DatabaseConnection,
}

impl SeaOrmSessionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SeaOrmSessionStore {
    async fn create(&self, user_id: i32, ttl: Duration) -> Result<SessionData> {
        let now = Utc::now();
        let data = SessionData {
            id: generate_secure_token(),
            user_id,
            csrf_token: generate_secure_token(),
            expires_at: now + ttl,
        };

        let model = session::ActiveModel {
            id: Set(data.id.clone()),
            user_id: Set(data.user_id),
            csrf_token: Set(data.csrf_token.clone()),
            created_at: Set(now),
            expires_at: Set(data.expires_at),
        };
        session::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(|e| LinkhubError::session(format!("Failed to create session: {}", e)))?;

        Ok(data)
    }

    async fn load(&self, session_id: &str) -> Result<Option<SessionData>> {
        let row = session::Entity::find_by_id(session_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| LinkhubError::session(format!("Failed to load session: {}", e)))?;

        match row {
            Some(model) if model.expires_at <= Utc::now() => {
                debug!("Session expired, removing");
                self.destroy(&model.id).await?;
                Ok(None)
            }
            Some(model) => Ok(Some(model.into())),
            None => Ok(None),
        }
    }

    async fn destroy(&self, session_id: &str) -> Result<()> {
        session::Entity::delete_by_id(session_id.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| LinkhubError::session(format!("Failed to destroy session: {}", e)))?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lte(Utc::now()))
            .exec(&self.db)
            .await
            .map_err(|e| LinkhubError::session(format!("Failed to purge sessions: {}", e)))?;
        Ok(result.rows_affected)
    }
}

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter, Set,
    SqlErr, sea_query::Expr, sea_query::OnConflict,
};
use tracing::debug;

use crate::errors::{LinkhubError, Result};
use migration::entities::{like, metric};

pub const VISITS_KEY: &str = "visits";

/// 点赞结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeOutcome {
    Added,
    AlreadyLiked,
}

/// 访问计数与点赞
#[derive(Clone)]
pub struct CounterRepository {
    db: DatabaseConnection,
}

impl CounterRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 确保 visits 计数行存在
    pub async fn seed(&self) -> Result<()> {
        let model = metric::ActiveModel {
            key: Set(VISITS_KEY.to_string()),
            value: Set(0),
        };
        let result = metric::Entity::insert(model)
            .on_conflict(
                OnConflict::column(metric::Column::Key)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) | Err(sea_orm::DbErr::RecordNotInserted) => Ok(()),
            Err(e) => Err(LinkhubError::database_operation(format!(
                "Failed to seed visits counter: {}",
                e
            ))),
        }
    }

    /// 访问计数 +1（单条原子 UPDATE）
    pub async fn increment_visits(&self) -> Result<()> {
        let result = metric::Entity::update_many()
            .col_expr(
                metric::Column::Value,
                Expr::col(metric::Column::Value).add(1),
            )
            .filter(metric::Column::Key.eq(VISITS_KEY))
            .exec(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!("Failed to count visit: {}", e))
            })?;

        if result.rows_affected == 0 {
            // 计数行被删掉了，重建后再计一次
            self.seed().await?;
            metric::Entity::update_many()
                .col_expr(
                    metric::Column::Value,
                    Expr::col(metric::Column::Value).add(1),
                )
                .filter(metric::Column::Key.eq(VISITS_KEY))
                .exec(&self.db)
                .await
                .map_err(|e| {
                    LinkhubError::database_operation(format!("Failed to count visit: {}", e))
                })?;
        }
        Ok(())
    }

    pub async fn visits(&self) -> Result<i64> {
        let row = metric::Entity::find_by_id(VISITS_KEY.to_string())
            .one(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!("Failed to read visits: {}", e))
            })?;
        Ok(row.map(|m| m.value).unwrap_or(0))
    }

    pub async fn like_count(&self) -> Result<u64> {
        like::Entity::find().count(&self.db).await.map_err(|e| {
            LinkhubError::database_operation(format!("Failed to count likes: {}", e))
        })
    }

    pub async fn has_liked(&self, ip: &str) -> Result<bool> {
        let row = like::Entity::find_by_id(ip.to_string())
            .one(&self.db)
            .await
            .map_err(|e| LinkhubError::database_operation(format!("Failed to read like: {}", e)))?;
        Ok(row.is_some())
    }

    /// 记录点赞（每个地址一次）
    ///
    /// 检查与插入之间存在竞争，唯一键冲突按已点赞处理。
    pub async fn add_like(&self, ip: &str) -> Result<LikeOutcome> {
        if self.has_liked(ip).await? {
            return Ok(LikeOutcome::AlreadyLiked);
        }

        let model = like::ActiveModel {
            ip: Set(ip.to_string()),
            created_at: Set(Utc::now()),
        };

        match like::Entity::insert(model).exec(&self.db).await {
            Ok(_) => Ok(LikeOutcome::Added),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!("Concurrent like from {} absorbed", ip);
                Ok(LikeOutcome::AlreadyLiked)
            }
            Err(e) => Err(LinkhubError::database_operation(format!(
                "Failed to save like: {}",
                e
            ))),
        }
    }
}

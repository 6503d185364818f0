use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};
use tracing::info;

use super::ListFilter;
use super::links::{URL_MAX, truncate};
use crate::errors::{LinkhubError, Result};
use migration::entities::redirect;

pub type Redirect = redirect::Model;

/// 短链写入参数（以 slug 为键）。slug 应已规范化。
#[derive(Debug, Clone)]
pub struct RedirectRecord {
    pub slug: String,
    pub target_url: String,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct RedirectRepository {
    db: DatabaseConnection,
}

impl RedirectRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 按 slug 升序列出；`VisibleOnly` 表示仅启用的
    pub async fn list(&self, filter: ListFilter) -> Result<Vec<Redirect>> {
        let mut query = redirect::Entity::find();
        if filter == ListFilter::VisibleOnly {
            query = query.filter(redirect::Column::IsActive.eq(true));
        }
        query
            .order_by_asc(redirect::Column::Slug)
            .all(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!("Failed to list redirects: {}", e))
            })
    }

    pub async fn find_active(&self, slug: &str) -> Result<Option<Redirect>> {
        redirect::Entity::find()
            .filter(redirect::Column::Slug.eq(slug))
            .filter(redirect::Column::IsActive.eq(true))
            .one(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!("Failed to look up redirect: {}", e))
            })
    }

    /// 按 slug upsert：不存在则插入，存在则更新目标与启用状态
    pub async fn upsert(&self, record: RedirectRecord) -> Result<()> {
        let model = redirect::ActiveModel {
            slug: Set(record.slug.clone()),
            target_url: Set(truncate(&record.target_url, URL_MAX)),
            is_active: Set(record.is_active),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        redirect::Entity::insert(model)
            .on_conflict(
                OnConflict::column(redirect::Column::Slug)
                    .update_columns([redirect::Column::TargetUrl, redirect::Column::IsActive])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!(
                    "Failed to save redirect {}: {}",
                    record.slug, e
                ))
            })?;

        info!("Redirect saved: /{} -> {}", record.slug, record.target_url);
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = redirect::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!("Failed to delete redirect: {}", e))
            })?;
        Ok(result.rows_affected > 0)
    }
}

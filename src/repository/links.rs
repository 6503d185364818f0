use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use super::ListFilter;
use crate::errors::{LinkhubError, Result};
use migration::entities::link;

pub type Link = link::Model;

pub const TITLE_MAX: usize = 255;
pub const URL_MAX: usize = 2048;
pub const ICON_KEY_MAX: usize = 50;
pub const COLOR_MAX: usize = 20;

/// 链接写入参数。`id` 为空时插入，否则更新。
#[derive(Debug, Clone, Default)]
pub struct LinkRecord {
    pub id: Option<i32>,
    pub title: String,
    pub url: String,
    pub icon_key: Option<String>,
    pub order_index: i32,
    pub is_visible: bool,
    pub color_hex: Option<String>,
}

#[derive(Clone)]
pub struct LinkRepository {
    db: DatabaseConnection,
}

impl LinkRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// 按 (order_index, id) 升序列出
    pub async fn list(&self, filter: ListFilter) -> Result<Vec<Link>> {
        let mut query = link::Entity::find();
        if filter == ListFilter::VisibleOnly {
            query = query.filter(link::Column::IsVisible.eq(true));
        }
        query
            .order_by_asc(link::Column::OrderIndex)
            .order_by_asc(link::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LinkhubError::database_operation(format!("Failed to list links: {}", e)))
    }

    /// 插入或更新
    ///
    /// 返回写入行的 id；更新一个不存在的 id 时不做任何事并返回 `None`。
    pub async fn upsert(&self, record: LinkRecord) -> Result<Option<i32>> {
        let model = link::ActiveModel {
            title: Set(truncate(&record.title, TITLE_MAX)),
            url: Set(truncate(&record.url, URL_MAX)),
            icon_key: Set(record.icon_key.map(|v| truncate(&v, ICON_KEY_MAX))),
            order_index: Set(record.order_index),
            is_visible: Set(record.is_visible),
            color_hex: Set(record.color_hex.map(|v| truncate(&v, COLOR_MAX))),
            ..Default::default()
        };

        match record.id {
            Some(id) => {
                let result = link::Entity::update_many()
                    .set(model)
                    .filter(link::Column::Id.eq(id))
                    .exec(&self.db)
                    .await
                    .map_err(|e| {
                        LinkhubError::database_operation(format!("Failed to update link {}: {}", id, e))
                    })?;
                Ok((result.rows_affected > 0).then_some(id))
            }
            None => {
                let inserted = model.insert(&self.db).await.map_err(|e| {
                    LinkhubError::database_operation(format!("Failed to insert link: {}", e))
                })?;
                info!("Link created: {} -> {}", inserted.id, inserted.url);
                Ok(Some(inserted.id))
            }
        }
    }

    /// 删除，返回是否有行被删除
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = link::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| LinkhubError::database_operation(format!("Failed to delete link: {}", e)))?;
        Ok(result.rows_affected > 0)
    }
}

/// 按字符截断（不会切断 UTF-8 字符）
pub(crate) fn truncate(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

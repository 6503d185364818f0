use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::ListFilter;
use super::links::{TITLE_MAX, truncate};
use crate::errors::{LinkhubError, Result};
use crate::services::sanitizer::{Policy, sanitize};
use migration::entities::embed;

pub type Embed = embed::Model;

/// 嵌入块写入参数。`embed_html` 在写入前按嵌入策略清洗。
#[derive(Debug, Clone, Default)]
pub struct EmbedRecord {
    pub id: Option<i32>,
    pub title: Option<String>,
    pub embed_html: String,
    pub order_index: i32,
    pub is_visible: bool,
}

#[derive(Clone)]
pub struct EmbedRepository {
    db: DatabaseConnection,
}

impl EmbedRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: ListFilter) -> Result<Vec<Embed>> {
        let mut query = embed::Entity::find();
        if filter == ListFilter::VisibleOnly {
            query = query.filter(embed::Column::IsVisible.eq(true));
        }
        query
            .order_by_asc(embed::Column::OrderIndex)
            .order_by_asc(embed::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| LinkhubError::database_operation(format!("Failed to list embeds: {}", e)))
    }

    pub async fn upsert(&self, record: EmbedRecord) -> Result<Option<i32>> {
        let model = embed::ActiveModel {
            title: Set(record.title.map(|t| truncate(&t, TITLE_MAX))),
            embed_html: Set(sanitize(&record.embed_html, Policy::Embed)),
            order_index: Set(record.order_index),
            is_visible: Set(record.is_visible),
            ..Default::default()
        };

        match record.id {
            Some(id) => {
                let result = embed::Entity::update_many()
                    .set(model)
                    .filter(embed::Column::Id.eq(id))
                    .exec(&self.db)
                    .await
                    .map_err(|e| {
                        LinkhubError::database_operation(format!(
                            "Failed to update embed {}: {}",
                            id, e
                        ))
                    })?;
                Ok((result.rows_affected > 0).then_some(id))
            }
            None => {
                let inserted = model.insert(&self.db).await.map_err(|e| {
                    LinkhubError::database_operation(format!("Failed to insert embed: {}", e))
                })?;
                Ok(Some(inserted.id))
            }
        }
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = embed::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!("Failed to delete embed: {}", e))
            })?;
        Ok(result.rows_affected > 0)
    }
}

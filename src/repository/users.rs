use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::errors::{LinkhubError, Result};
use migration::entities::user;

pub type User = user::Model;

#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| LinkhubError::database_operation(format!("Failed to load user: {}", e)))
    }

    pub async fn create(&self, username: &str, password_hash: &str) -> Result<User> {
        user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| LinkhubError::database_operation(format!("Failed to create user: {}", e)))
    }

    pub async fn update_password_hash(&self, id: i32, password_hash: &str) -> Result<bool> {
        let result = user::Entity::update_many()
            .set(user::ActiveModel {
                password_hash: Set(password_hash.to_string()),
                ..Default::default()
            })
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!("Failed to update password: {}", e))
            })?;
        Ok(result.rows_affected > 0)
    }
}

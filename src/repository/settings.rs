use std::collections::HashMap;

use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};
use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator};
use tracing::debug;

use crate::errors::{LinkhubError, Result};
use crate::services::sanitizer::{Policy, sanitize};
use migration::entities::setting;

/// 可写入的设置项白名单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SettingKey {
    SiteTitle,
    BgYoutubeId,
    FooterHtml,
    TwitchChannel,
    TiktokEmbedHtml,
    DisplayName,
    Handle,
    Bio,
    AvatarPath,
    PageTitle,
    SiteUrl,
    OgImage,
    OgDescription,
    ThemeColor,
}

impl SettingKey {
    /// 值为 HTML，写入前需要清洗
    pub fn is_html(self) -> bool {
        matches!(
            self,
            SettingKey::FooterHtml
                | SettingKey::TiktokEmbedHtml
                | SettingKey::Bio
                | SettingKey::OgDescription
        )
    }

    /// 首次启动时写入的默认值
    pub fn default_value(self, public_domain: &str) -> String {
        match self {
            SettingKey::SiteTitle => "LinkHub".to_string(),
            SettingKey::FooterHtml => "<p>© {{YEAR}} LinkHub</p>".to_string(),
            SettingKey::PageTitle => "My LinkHub".to_string(),
            SettingKey::SiteUrl => format!("https://{}", public_domain),
            SettingKey::ThemeColor => "#ff4d6d".to_string(),
            _ => String::new(),
        }
    }

    /// Sanitize or trim a raw value according to the key's kind.
    pub fn clean_value(self, raw: &str) -> String {
        if self.is_html() {
            sanitize(raw, Policy::RichText)
        } else {
            raw.trim().to_string()
        }
    }
}

/// 页面设置存储（key/value）
#[derive(Clone)]
pub struct SettingsStore {
    db: DatabaseConnection,
}

impl SettingsStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = setting::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!("Failed to read setting {}: {}", key, e))
            })?;
        Ok(row.map(|m| m.value))
    }

    /// 读取全部设置。未知 key 也会返回。
    pub async fn get_all(&self) -> Result<HashMap<String, String>> {
        let rows = setting::Entity::find().all(&self.db).await.map_err(|e| {
            LinkhubError::database_operation(format!("Failed to read settings: {}", e))
        })?;
        Ok(rows.into_iter().map(|m| (m.key, m.value)).collect())
    }

    /// 写入设置项
    ///
    /// 不在白名单中的 key 被忽略并返回 `false`。
    pub async fn set(&self, key: &str, value: &str) -> Result<bool> {
        let Ok(setting_key) = key.parse::<SettingKey>() else {
            debug!("Ignoring write to unknown setting key: {}", key);
            return Ok(false);
        };
        self.set_key(setting_key, value).await?;
        Ok(true)
    }

    pub async fn set_key(&self, key: SettingKey, value: &str) -> Result<()> {
        let model = setting::ActiveModel {
            key: Set(key.as_ref().to_string()),
            value: Set(key.clean_value(value)),
        };

        setting::Entity::insert(model)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_column(setting::Column::Value)
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| {
                LinkhubError::database_operation(format!(
                    "Failed to save setting {}: {}",
                    key.as_ref(),
                    e
                ))
            })?;
        Ok(())
    }

    /// 写入缺失的默认值，已有值不会被覆盖
    ///
    /// 返回实际插入的条目数
    pub async fn seed_defaults(&self, public_domain: &str) -> Result<usize> {
        let existing = self.get_all().await?;
        let mut inserted = 0;

        for key in SettingKey::iter() {
            if existing.contains_key(key.as_ref()) {
                continue;
            }
            let model = setting::ActiveModel {
                key: Set(key.as_ref().to_string()),
                value: Set(key.default_value(public_domain)),
            };
            let result = setting::Entity::insert(model)
                .on_conflict(
                    OnConflict::column(setting::Column::Key)
                        .do_nothing()
                        .to_owned(),
                )
                .exec(&self.db)
                .await;

            match result {
                Ok(_) => inserted += 1,
                Err(sea_orm::DbErr::RecordNotInserted) => {}
                Err(e) => {
                    return Err(LinkhubError::database_operation(format!(
                        "Failed to seed setting {}: {}",
                        key.as_ref(),
                        e
                    )));
                }
            }
        }

        Ok(inserted)
    }
}

//! 头像与 OG 图片上传
//!
//! 先校验（类型、大小）再落盘；文件写入 `<static_dir>/uploads/`，
//! 对外路径为 `/static/uploads/<name>`。

use std::path::PathBuf;

use bytes::Bytes;
use chrono::Utc;
use tracing::info;

use crate::errors::{LinkhubError, Result};
use crate::repository::SettingKey;

pub const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
    "image/svg+xml",
];

const DEFAULT_EXTENSION: &str = "png";
const PUBLIC_PREFIX: &str = "/static/uploads";

/// 上传字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Avatar,
    OgImage,
}

impl UploadKind {
    pub fn from_field(name: &str) -> Option<Self> {
        match name {
            "avatar" => Some(UploadKind::Avatar),
            "og_image_file" => Some(UploadKind::OgImage),
            _ => None,
        }
    }

    /// 上传成功后写入的设置项
    pub fn setting_key(self) -> SettingKey {
        match self {
            UploadKind::Avatar => SettingKey::AvatarPath,
            UploadKind::OgImage => SettingKey::OgImage,
        }
    }

    /// `avatar.<ext>` 或 `og-<unix 毫秒>.<ext>`
    pub fn file_name(self, extension: &str, timestamp_millis: i64) -> String {
        match self {
            UploadKind::Avatar => format!("avatar.{}", extension),
            UploadKind::OgImage => format!("og-{}.{}", timestamp_millis, extension),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub kind: UploadKind,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
    pub data: Bytes,
}

/// 从客户端文件名取扩展名：小写、1-5 位字母数字，否则为 png
pub fn extension_for(file_name: Option<&str>) -> String {
    file_name
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

#[derive(Debug, Clone)]
pub struct UploadService {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(static_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: static_dir.into().join("uploads"),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn validate(&self, upload: &PendingUpload) -> Result<()> {
        if upload.data.len() > self.max_bytes {
            return Err(LinkhubError::validation(format!(
                "Image too large (max {} MB)",
                self.max_bytes / (1024 * 1024)
            )));
        }

        let content_type = upload
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .unwrap_or_default();
        if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(LinkhubError::validation(
                "Only PNG, JPEG, WEBP, GIF or SVG images are allowed",
            ));
        }
        Ok(())
    }

    /// 写入文件，返回对外路径
    pub async fn store(&self, upload: &PendingUpload) -> Result<String> {
        let extension = extension_for(upload.file_name.as_deref());
        let name = upload
            .kind
            .file_name(&extension, Utc::now().timestamp_millis());

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            LinkhubError::file_operation(format!(
                "Failed to create upload directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let path = self.dir.join(&name);
        tokio::fs::write(&path, &upload.data).await.map_err(|e| {
            LinkhubError::file_operation(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!("Stored upload {} ({} bytes)", name, upload.data.len());
        Ok(format!("{}/{}", PUBLIC_PREFIX, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(content_type: &str, size: usize) -> PendingUpload {
        PendingUpload {
            kind: UploadKind::Avatar,
            content_type: Some(content_type.to_string()),
            file_name: Some("me.PNG".to_string()),
            data: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(Some("me.PNG")), "png");
        assert_eq!(extension_for(Some("photo.jpeg")), "jpeg");
        assert_eq!(extension_for(Some("noext")), "png");
        assert_eq!(extension_for(Some("evil.p/hp")), "png");
        assert_eq!(extension_for(Some("long.extension")), "png");
        assert_eq!(extension_for(None), "png");
    }

    #[test]
    fn test_file_names() {
        assert_eq!(UploadKind::Avatar.file_name("png", 1), "avatar.png");
        assert_eq!(UploadKind::OgImage.file_name("webp", 1700000000000), "og-1700000000000.webp");
    }

    #[test]
    fn test_validate() {
        let service = UploadService::new("/tmp/unused", 1024);
        assert!(service.validate(&upload("image/png", 10)).is_ok());
        assert!(service.validate(&upload("image/svg+xml", 10)).is_ok());
        assert!(service.validate(&upload("text/html", 10)).is_err());
        assert!(service.validate(&upload("image/png", 2048)).is_err());
    }

    #[tokio::test]
    async fn test_store_writes_into_uploads_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let service = UploadService::new(dir.path(), 1024);

        let path = service.store(&upload("image/png", 4)).await.unwrap();
        assert_eq!(path, "/static/uploads/avatar.png");
        assert!(dir.path().join("uploads").join("avatar.png").exists());
    }
}

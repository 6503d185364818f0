//! 短链解析
//!
//! 未被其它路由匹配的单段路径在这里查找启用的 redirect。
//! 保留名永远不会被解析，即使数据库里存在同名记录。

use tracing::{debug, trace};
use url::Url;

use crate::errors::{LinkhubError, Result};
use crate::repository::{ListFilter, Redirect, RedirectRecord, RedirectRepository};

pub const RESERVED_SLUGS: [&str; 4] = ["admin", "static", "api", "debug"];

pub fn is_reserved(slug: &str) -> bool {
    RESERVED_SLUGS.contains(&slug)
}

/// 写入前规范化：去空白、去首尾斜杠、转小写
pub fn normalize_slug(raw: &str) -> String {
    raw.trim().trim_matches('/').trim().to_lowercase()
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() {
        return Err(LinkhubError::validation("Slug is required"));
    }
    if slug.contains('/') || slug.chars().any(char::is_whitespace) {
        return Err(LinkhubError::validation(
            "Slug must be a single path segment without spaces",
        ));
    }
    if is_reserved(slug) {
        return Err(LinkhubError::validation(format!(
            "'{}' is a reserved name",
            slug
        )));
    }
    Ok(())
}

/// 目标地址必须是绝对 http(s) URL
pub fn validate_target(raw: &str) -> Result<String> {
    let target = raw.trim();
    if target.is_empty() {
        return Err(LinkhubError::validation("Target URL is required"));
    }
    match Url::parse(target) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(target.to_string())
        }
        _ => Err(LinkhubError::validation(
            "Target URL must start with http:// or https://",
        )),
    }
}

#[derive(Clone)]
pub struct RedirectService {
    repo: RedirectRepository,
}

impl RedirectService {
    pub fn new(repo: RedirectRepository) -> Self {
        Self { repo }
    }

    /// 解析路径段，返回目标 URL；`None` 表示交给 404
    pub async fn resolve(&self, segment: &str) -> Result<Option<String>> {
        let slug = segment.to_lowercase();
        if is_reserved(&slug) {
            trace!("Reserved path segment declined: {}", slug);
            return Ok(None);
        }

        let target = self.repo.find_active(&slug).await?.map(|r| r.target_url);
        if target.is_none() {
            debug!("No active redirect for /{}", slug);
        }
        Ok(target)
    }

    /// 规范化并校验后按 slug upsert
    pub async fn save(&self, raw_slug: &str, raw_target: &str, is_active: bool) -> Result<String> {
        let slug = normalize_slug(raw_slug);
        validate_slug(&slug)?;
        let target_url = validate_target(raw_target)?;

        self.repo
            .upsert(RedirectRecord {
                slug: slug.clone(),
                target_url,
                is_active,
            })
            .await?;
        Ok(slug)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        self.repo.delete(id).await
    }

    pub async fn list(&self) -> Result<Vec<Redirect>> {
        self.repo.list(ListFilter::All).await
    }
}

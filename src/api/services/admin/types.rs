//! 请求 / 响应 DTO
//!
//! 表单里的空字符串（未填写的隐藏 id、数字框）按缺省处理；
//! 复选框只要出现在表单中即视为选中。

use std::fmt::Display;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(de::Error::custom),
    }
}

fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.is_some_and(|v| !matches!(v.trim(), "" | "0" | "false" | "off")))
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub id: Option<i32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub icon_key: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub order_index: Option<i32>,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_visible: bool,
    #[serde(default)]
    pub color_hex: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub id: Option<i32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub embed_html: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub order_index: Option<i32>,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_visible: bool,
}

/// 重定向按 slug upsert，表单中的 id 字段会被忽略
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectForm {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default, deserialize_with = "checkbox")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteForm {
    pub id: i32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsResponse {
    pub visits: i64,
    pub likes: u64,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LikeResponse {
    pub liked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<u64>,
}

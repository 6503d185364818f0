//! 公共页面视图模型
//!
//! 纯函数：输入设置、可见链接、可见嵌入块与上下文，输出模板所需的全部字段。

use std::collections::HashMap;

use serde::Serialize;
use url::Url;

use crate::repository::{Embed, Link, SettingKey};
use crate::services::sanitizer::strip_tags;

pub const DEFAULT_META_DESCRIPTION: &str = "All my links in one place!";
pub const DEFAULT_OG_IMAGE: &str = "/static/og-default.jpg";
pub const META_DESCRIPTION_MAX: usize = 280;
const YEAR_PLACEHOLDER: &str = "{{YEAR}}";

/// 页面渲染上下文
#[derive(Debug, Clone)]
pub struct PageContext {
    pub public_domain: String,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageViewModel {
    pub settings: HashMap<String, String>,
    pub site_url: String,
    pub meta_description: String,
    pub og_image: String,
    pub footer_html: String,
    pub twitch_parent: String,
    pub links: Vec<Link>,
    pub embeds: Vec<Embed>,
}

pub fn assemble(
    settings: HashMap<String, String>,
    links: Vec<Link>,
    embeds: Vec<Embed>,
    ctx: &PageContext,
) -> PageViewModel {
    let get = |key: SettingKey| settings.get(key.as_ref()).map(String::as_str).unwrap_or("");

    let site_url = resolve_site_url(get(SettingKey::SiteUrl), &ctx.public_domain);
    let meta_description = meta_description(get(SettingKey::OgDescription), get(SettingKey::Bio));
    let og_image = resolve_og_image(get(SettingKey::OgImage), get(SettingKey::AvatarPath), &site_url);
    let footer_html = render_footer(get(SettingKey::FooterHtml), ctx.year);

    PageViewModel {
        site_url,
        meta_description,
        og_image,
        footer_html,
        twitch_parent: ctx.public_domain.clone(),
        settings,
        links,
        embeds,
    }
}

/// 替换页脚中的 `{{YEAR}}`
pub fn render_footer(footer_html: &str, year: i32) -> String {
    footer_html.replace(YEAR_PLACEHOLDER, &year.to_string())
}

fn is_absolute_http(value: &str) -> bool {
    Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}

/// 站点 URL：有效的绝对 http(s) 地址，否则回退到 `https://<public_domain>`
pub fn resolve_site_url(stored: &str, public_domain: &str) -> String {
    let stored = stored.trim();
    if is_absolute_http(stored) {
        stored.to_string()
    } else {
        format!("https://{}", public_domain)
    }
}

/// meta 描述：OG 描述 → bio 纯文本 → 默认文案，最多 280 个字符
pub fn meta_description(og_description: &str, bio: &str) -> String {
    let description = [og_description, bio]
        .into_iter()
        .map(plain_text)
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| DEFAULT_META_DESCRIPTION.to_string());

    description.chars().take(META_DESCRIPTION_MAX).collect()
}

fn plain_text(html: &str) -> String {
    strip_tags(html).trim().to_string()
}

/// OG 图片：og_image → avatar_path → 默认图；相对路径挂到站点 URL 下
pub fn resolve_og_image(og_image: &str, avatar_path: &str, site_url: &str) -> String {
    let image = [og_image.trim(), avatar_path.trim()]
        .into_iter()
        .find(|v| !v.is_empty())
        .unwrap_or(DEFAULT_OG_IMAGE);

    let lower = image.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return image.to_string();
    }

    format!(
        "{}/{}",
        site_url.trim_end_matches('/'),
        image.trim_start_matches('/')
    )
}

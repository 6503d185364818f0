//! 管理后台首页

use std::path::Path;

use actix_web::http::StatusCode;
use actix_web::http::header::{CACHE_CONTROL, HeaderValue};
use actix_web::{HttpResponse, web};
use tera::Context;
use tracing::debug;

use crate::api::middleware::AdminSession;
use crate::api::render::DASHBOARD_TEMPLATE;
use crate::errors::Result;
use crate::repository::ListFilter;
use crate::state::AppState;

const SOCIAL_ICONS_DIR: &str = "images/socials";

/// `<static_dir>/images/socials` 下所有 `*.svg` 的文件名（不含扩展名），排序后返回
pub async fn social_icons(static_dir: &Path) -> Vec<String> {
    let dir = static_dir.join(SOCIAL_ICONS_DIR);
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No social icons at {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut icons = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "svg")
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            icons.push(stem.to_string());
        }
    }
    icons.sort();
    icons
}

/// 渲染后台页面；`error` 用于表单校验失败时的内联提示
pub async fn render_dashboard(
    state: &AppState,
    session: &AdminSession,
    status: StatusCode,
    error: Option<&str>,
) -> Result<HttpResponse> {
    let settings = state.settings.get_all().await?;
    let links = state.links.list(ListFilter::All).await?;
    let embeds = state.embeds.list(ListFilter::All).await?;
    let redirects = state.redirects.list().await?;
    let icons = social_icons(Path::new(&state.config.server.static_dir)).await;

    let mut context = Context::new();
    context.insert("settings", &settings);
    context.insert("links", &links);
    context.insert("embeds", &embeds);
    context.insert("redirects", &redirects);
    context.insert("icons", &icons);
    context.insert("csrf_token", &session.csrf_token);
    context.insert("error", &error);
    context.insert("max_upload_mb", &(state.uploads.max_bytes() / (1024 * 1024)));

    let mut response = state.renderer.respond(status, DASHBOARD_TEMPLATE, &context);
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

/// GET /admin
pub async fn dashboard(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
) -> Result<HttpResponse> {
    render_dashboard(&state, &session, StatusCode::OK, None).await
}

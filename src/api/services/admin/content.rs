//! 链接、嵌入块、重定向的增删改
//!
//! 成功后 302 回到后台首页；校验失败时带提示重新渲染后台（400）。

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, web};
use tracing::info;
use url::Url;

use crate::api::constants::ADMIN_PATH;
use crate::api::middleware::AdminSession;
use crate::errors::{LinkhubError, Result};
use crate::repository::{EmbedRecord, LinkRecord};
use crate::state::AppState;

use super::dashboard::render_dashboard;
use super::types::{DeleteForm, EmbedForm, LinkForm, RedirectForm};

pub(crate) fn back_to_dashboard() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, ADMIN_PATH))
        .finish()
}

/// 校验错误渲染为带提示的后台页面，其它错误继续向上传播
pub(crate) async fn reject(
    state: &AppState,
    session: &AdminSession,
    err: LinkhubError,
) -> Result<HttpResponse> {
    match err {
        LinkhubError::Validation(message) => {
            info!("Admin form rejected: {}", message);
            render_dashboard(state, session, StatusCode::BAD_REQUEST, Some(&message)).await
        }
        other => Err(other),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// 链接地址：http(s)、mailto、tel 绝对地址，或以 `/` 开头的站内路径
pub fn validate_link_url(raw: &str) -> Result<String> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(LinkhubError::validation("Link URL is required"));
    }
    if url.starts_with('/') && !url.starts_with("//") {
        return Ok(url.to_string());
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https" | "mailto" | "tel") => {
            Ok(url.to_string())
        }
        _ => Err(LinkhubError::validation(
            "Link URL must be an http(s), mailto: or tel: address",
        )),
    }
}

fn link_record(form: LinkForm) -> Result<LinkRecord> {
    let title = non_empty(&form.title).ok_or_else(|| LinkhubError::validation("Link title is required"))?;
    let url = validate_link_url(&form.url)?;

    Ok(LinkRecord {
        id: form.id,
        title,
        url,
        icon_key: non_empty(&form.icon_key),
        order_index: form.order_index.unwrap_or(0),
        is_visible: form.is_visible,
        color_hex: non_empty(&form.color_hex),
    })
}

fn embed_record(form: EmbedForm) -> Result<EmbedRecord> {
    if form.embed_html.trim().is_empty() {
        return Err(LinkhubError::validation("Embed HTML is required"));
    }
    Ok(EmbedRecord {
        id: form.id,
        title: non_empty(&form.title),
        embed_html: form.embed_html,
        order_index: form.order_index.unwrap_or(0),
        is_visible: form.is_visible,
    })
}

/// POST /admin/link
pub async fn save_link(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    form: web::Form<LinkForm>,
) -> Result<HttpResponse> {
    let record = match link_record(form.into_inner()) {
        Ok(record) => record,
        Err(e) => return reject(&state, &session, e).await,
    };

    if state.links.upsert(record).await?.is_none() {
        info!("Link update skipped: id no longer exists");
    }
    Ok(back_to_dashboard())
}

/// POST /admin/link/delete
pub async fn delete_link(
    state: web::Data<AppState>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse> {
    if state.links.delete(form.id).await? {
        info!("Link {} deleted", form.id);
    }
    Ok(back_to_dashboard())
}

/// POST /admin/embed
pub async fn save_embed(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    form: web::Form<EmbedForm>,
) -> Result<HttpResponse> {
    let record = match embed_record(form.into_inner()) {
        Ok(record) => record,
        Err(e) => return reject(&state, &session, e).await,
    };

    state.embeds.upsert(record).await?;
    Ok(back_to_dashboard())
}

/// POST /admin/embed/delete
pub async fn delete_embed(
    state: web::Data<AppState>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse> {
    if state.embeds.delete(form.id).await? {
        info!("Embed {} deleted", form.id);
    }
    Ok(back_to_dashboard())
}

/// POST /admin/redirect
pub async fn save_redirect(
    state: web::Data<AppState>,
    session: web::ReqData<AdminSession>,
    form: web::Form<RedirectForm>,
) -> Result<HttpResponse> {
    match state
        .redirects
        .save(&form.slug, &form.target_url, form.is_active)
        .await
    {
        Ok(slug) => {
            info!("Redirect /{} saved", slug);
            Ok(back_to_dashboard())
        }
        Err(e) => reject(&state, &session, e).await,
    }
}

/// POST /admin/redirect/delete
pub async fn delete_redirect(
    state: web::Data<AppState>,
    form: web::Form<DeleteForm>,
) -> Result<HttpResponse> {
    if state.redirects.delete(form.id).await? {
        info!("Redirect {} deleted", form.id);
    }
    Ok(back_to_dashboard())
}

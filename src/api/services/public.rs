//! 公共页面与点赞统计

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{Datelike, Utc};
use tera::Context;
use tracing::{debug, warn};

use crate::api::render::INDEX_TEMPLATE;
use crate::api::services::admin::{LikeResponse, StatsResponse};
use crate::errors::Result;
use crate::repository::{LikeOutcome, ListFilter};
use crate::services::page::{self, PageContext};
use crate::state::AppState;
use crate::utils::ip::extract_client_ip;

fn client_ip(req: &HttpRequest, state: &AppState) -> String {
    extract_client_ip(&req.connection_info(), req.headers(), state.trusted_proxies())
}

/// GET /
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse> {
    // 计数失败不影响页面展示
    if let Err(e) = state.counters.increment_visits().await {
        warn!("Failed to record visit: {}", e);
    }

    let settings = state.settings.get_all().await?;
    let links = state.links.list(ListFilter::VisibleOnly).await?;
    let embeds = state.embeds.list(ListFilter::VisibleOnly).await?;

    let ctx = PageContext {
        public_domain: state.config.site.public_domain.clone(),
        year: Utc::now().year(),
    };
    let view = page::assemble(settings, links, embeds, &ctx);
    let context = Context::from_serialize(&view)?;

    Ok(state
        .renderer
        .respond(StatusCode::OK, INDEX_TEMPLATE, &context))
}

/// GET /api/stats
pub async fn stats(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let ip = client_ip(&req, &state);
    let response = StatsResponse {
        visits: state.counters.visits().await?,
        likes: state.counters.like_count().await?,
        liked: state.counters.has_liked(&ip).await?,
    };
    Ok(HttpResponse::Ok().json(response))
}

/// POST /api/like
///
/// 每个客户端地址只计一次；重复点赞返回 `liked: true` 但不带计数。
pub async fn like(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let ip = client_ip(&req, &state);

    let response = match state.counters.add_like(&ip).await? {
        LikeOutcome::Added => LikeResponse {
            liked: true,
            likes: Some(state.counters.like_count().await?),
        },
        LikeOutcome::AlreadyLiked => {
            debug!("Duplicate like from {}", ip);
            LikeResponse {
                liked: true,
                likes: None,
            }
        }
    };
    Ok(HttpResponse::Ok().json(response))
}

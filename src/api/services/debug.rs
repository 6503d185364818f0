//! 调试端点，仅在 `server.enable_debug_routes` 开启时注册，并且需要登录

use actix_web::{HttpResponse, web};

use crate::errors::Result;
use crate::state::AppState;

/// GET /debug/settings
pub async fn debug_settings(state: web::Data<AppState>) -> Result<HttpResponse> {
    let settings = state.settings.get_all().await?;
    Ok(HttpResponse::Ok().json(settings))
}

//! 管理后台登录 / 登出

use std::sync::Arc;

use actix_governor::{Governor, GovernorConfig, GovernorConfigBuilder, KeyExtractor, SimpleKeyExtractionError};
use actix_web::dev::ServiceRequest;
use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, web};
use governor::middleware::NoOpMiddleware;
use tera::Context;
use tracing::{debug, info};

use crate::api::constants::{ADMIN_PATH, LOGIN_PATH, SESSION_COOKIE_NAME};
use crate::api::render::LOGIN_TEMPLATE;
use crate::config::LoginLimitConfig;
use crate::errors::{LinkhubError, Result};
use crate::state::AppState;
use crate::utils::ip::extract_client_ip;

use super::types::LoginForm;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub type LoginLimiterConfig = GovernorConfig<LoginKeyExtractor, NoOpMiddleware>;

/// 基于客户端 IP 的限流 key 提取器
///
/// 只有来自可信代理（或未配置列表时的私有地址）的请求才会采用转发头中的地址。
#[derive(Clone)]
pub struct LoginKeyExtractor {
    trusted_proxies: Arc<Vec<String>>,
}

impl KeyExtractor for LoginKeyExtractor {
    type Key = String;
    type KeyExtractionError = SimpleKeyExtractionError<&'static str>;

    fn extract(&self, req: &ServiceRequest) -> std::result::Result<Self::Key, Self::KeyExtractionError> {
        let key = extract_client_ip(&req.connection_info(), req.headers(), &self.trusted_proxies);
        debug!("Login rate limit key: {}", key);
        Ok(key)
    }
}

/// 构建登录限流配置
///
/// 窗口内最多 `max_attempts` 次，每 `window_secs / max_attempts` 秒补充一次。
/// 配置在启动时构建一次，所有 worker 共享同一个计数器。超限返回 429。
pub fn login_rate_limit(
    config: &LoginLimitConfig,
    trusted_proxies: &[String],
) -> Result<LoginLimiterConfig> {
    let attempts = config.max_attempts.max(1);
    let period = (config.window_secs / u64::from(attempts)).max(1);

    GovernorConfigBuilder::default()
        .seconds_per_request(period)
        .burst_size(attempts)
        .key_extractor(LoginKeyExtractor {
            trusted_proxies: Arc::new(trusted_proxies.to_vec()),
        })
        .finish()
        .ok_or_else(|| LinkhubError::config("Invalid login rate limit configuration"))
}

pub fn login_rate_limiter(config: &LoginLimiterConfig) -> Governor<LoginKeyExtractor, NoOpMiddleware> {
    Governor::new(config)
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, location))
        .finish()
}

fn login_page_response(state: &AppState, status: StatusCode, error: Option<&str>) -> HttpResponse {
    let mut context = Context::new();
    context.insert("error", &error);
    context.insert("site_title", "LinkHub");
    state.renderer.respond(status, LOGIN_TEMPLATE, &context)
}

/// 请求 Cookie 中仍然有效的会话 id（签名有效即可，不查存储）
fn cookie_session_id(req: &HttpRequest, state: &AppState) -> Option<String> {
    let cookie = req.cookie(SESSION_COOKIE_NAME)?;
    state.tokens.verify(cookie.value()).ok()
}

/// GET /admin/login
pub async fn login_page(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    if let Some(session_id) = cookie_session_id(&req, &state)
        && state.auth.current_session(&session_id).await?.is_some()
    {
        return Ok(see_other(ADMIN_PATH));
    }
    Ok(login_page_response(&state, StatusCode::OK, None))
}

/// POST /admin/login
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let previous = cookie_session_id(&req, &state);

    let Some(session) = state
        .auth
        .login(&form.username, &form.password, previous.as_deref())
        .await?
    else {
        return Ok(login_page_response(
            &state,
            StatusCode::UNAUTHORIZED,
            Some(INVALID_CREDENTIALS),
        ));
    };

    let token = state.tokens.issue(&session)?;
    Ok(HttpResponse::Found()
        .insert_header((LOCATION, ADMIN_PATH))
        .cookie(state.tokens.session_cookie(token))
        .finish())
}

/// POST /admin/logout
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    if let Some(session_id) = cookie_session_id(&req, &state) {
        state.auth.logout(&session_id).await?;
        info!("Admin session {} logged out", session_id);
    }

    Ok(HttpResponse::Found()
        .insert_header((LOCATION, LOGIN_PATH))
        .cookie(state.tokens.expired_cookie())
        .finish())
}

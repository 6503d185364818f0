//! HTTP 层
//!
//! 中间件顺序（由外到内）：
//! RequestTrace → DefaultHeaders → Compress → 路由（/admin: AdminAuth → CsrfGuard）→ handler，
//! 未匹配的请求交给 404 页面。

pub mod constants;
pub mod middleware;
pub mod render;
pub mod services;
pub mod session_token;

use actix_governor::Governor;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::{Compress, DefaultHeaders};
use actix_web::{App, Error, HttpResponse, error, web};
use governor::middleware::NoOpMiddleware;
use tracing::debug;

use crate::state::AppState;
use constants::ADMIN_PATH;
use middleware::{AdminAuth, CsrfGuard, RequestTrace};
use services::admin::{self, auth::LoginKeyExtractor};
use services::{assets, debug as debug_routes, public};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
    script-src 'self'; \
    style-src 'self' 'unsafe-inline'; \
    img-src 'self' https: data:; \
    frame-src https:; \
    connect-src 'self'; \
    object-src 'none'; \
    base-uri 'self'; \
    form-action 'self'; \
    frame-ancestors 'none'";

fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Content-Security-Policy", CONTENT_SECURITY_POLICY))
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
}

/// 通用 400 响应，不回显任何请求内容
pub(crate) fn bad_request_response() -> HttpResponse {
    HttpResponse::BadRequest()
        .content_type("text/plain; charset=utf-8")
        .body("Bad request")
}

/// 路径、表单、查询参数解析失败统一返回 400
fn bad_request(err: impl std::fmt::Display) -> Error {
    debug!("Rejected malformed request: {}", err);
    error::InternalError::from_response(err.to_string(), bad_request_response()).into()
}

/// 构建完整的应用，服务器和集成测试共用
///
/// `login_limiter` 需要在所有 worker 之间共享同一个计数器，
/// 调用方应从同一个 `LoginLimiterConfig` 构建。
pub fn create_app(
    state: web::Data<AppState>,
    login_limiter: Governor<LoginKeyExtractor, NoOpMiddleware>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let enable_debug = state.config.server.enable_debug_routes;

    App::new()
        .app_data(state)
        .app_data(web::PathConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::FormConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err)))
        .wrap(Compress::default())
        .wrap(security_headers())
        .wrap(RequestTrace)
        .route("/", web::get().to(public::index))
        .route("/api/stats", web::get().to(public::stats))
        .route("/api/like", web::post().to(public::like))
        .route("/static/{path:.*}", web::get().to(assets::serve_static))
        .service(
            // AdminAuth 在外层，CsrfGuard 依赖它写入的会话
            web::scope(ADMIN_PATH)
                .wrap(CsrfGuard)
                .wrap(AdminAuth)
                .route("", web::get().to(admin::dashboard))
                .route("/", web::get().to(admin::dashboard))
                .service(
                    web::resource("/login")
                        .route(web::get().to(admin::login_page))
                        .route(web::post().to(admin::login).wrap(login_limiter)),
                )
                .route("/logout", web::post().to(admin::logout))
                .route("/link", web::post().to(admin::save_link))
                .route("/link/delete", web::post().to(admin::delete_link))
                .route("/embed", web::post().to(admin::save_embed))
                .route("/embed/delete", web::post().to(admin::delete_embed))
                .route("/settings", web::post().to(admin::save_settings))
                .route("/redirect", web::post().to(admin::save_redirect))
                .route("/redirect/delete", web::post().to(admin::delete_redirect)),
        )
        .configure(|cfg| {
            if enable_debug {
                cfg.service(
                    web::scope("/debug")
                        .wrap(AdminAuth)
                        .route("/settings", web::get().to(debug_routes::debug_settings)),
                );
            }
        })
        .route("/{slug}", web::get().to(services::resolve_slug))
        .default_service(web::to(services::not_found))
}

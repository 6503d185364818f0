//! 集成测试公共环境
//!
//! 每个测试使用独立的临时 SQLite 数据库与静态目录。

#![allow(dead_code, unused_macros)]

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use linkhub::api::constants::SESSION_COOKIE_NAME;
use linkhub::config::AppConfig;
use linkhub::state::AppState;
use linkhub::storage;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub struct TestEnv {
    pub state: AppState,
    pub db: DatabaseConnection,
    _dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("linkhub_test.db").display()
    );
    config.server.static_dir = dir.path().join("public").display().to_string();
    config.server.workers = 1;
    config.admin.username = ADMIN_USERNAME.to_string();
    config.admin.password = ADMIN_PASSWORD.to_string();
    config.admin.password_hash_cost = 1;
    config.session.secret = "integration-test-secret-with-enough-bytes!".to_string();
    config.site.public_domain = "links.test".to_string();
    config
}

pub async fn setup() -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = test_config(&dir);

    let db = storage::connect(&config.database)
        .await
        .expect("Failed to open test database");
    let state = AppState::bootstrap(config, db.clone())
        .await
        .expect("Failed to bootstrap state");

    TestEnv {
        state,
        db,
        _dir: dir,
    }
}

/// 构建完整应用（含登录限流）
macro_rules! init_app {
    ($state:expr) => {{
        let state: linkhub::state::AppState = $state.clone();
        let limiter = linkhub::api::services::admin::auth::login_rate_limit(
            &state.config.login_limit,
            state.trusted_proxies(),
        )
        .expect("limiter config");
        actix_web::test::init_service(linkhub::api::create_app(
            actix_web::web::Data::new(state),
            linkhub::api::services::admin::auth::login_rate_limiter(&limiter),
        ))
        .await
    }};
}

/// 以管理员身份登录，返回会话 Cookie
macro_rules! login {
    ($app:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/admin/login")
            .set_form([
                ("username", common::ADMIN_USERNAME),
                ("password", common::ADMIN_PASSWORD),
            ])
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        common::session_cookie(&resp).expect("session cookie")
    }};
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE_NAME)
        .map(|c| c.into_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// 当前会话的 CSRF token
pub async fn csrf_token(state: &AppState, cookie: &Cookie<'_>) -> String {
    let sid = state
        .tokens
        .verify(cookie.value())
        .expect("session cookie should verify");
    state
        .auth
        .current_session(&sid)
        .await
        .expect("session lookup")
        .expect("session should exist")
        .csrf_token
}

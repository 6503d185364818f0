//! 管理后台集成测试：登录、会话、CSRF 与内容写入

#[macro_use]
mod common;

use std::net::SocketAddr;
use std::path::Path;

use actix_web::http::StatusCode;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::test::{self, TestRequest};

use linkhub::api::constants::{CSRF_HEADER, SESSION_COOKIE_NAME};
use linkhub::repository::ListFilter;

#[actix_rt::test]
async fn test_dashboard_requires_login() {
    let env = common::setup().await;
    let app = init_app!(env.state);

    let resp = test::call_service(&app, TestRequest::get().uri("/admin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp).as_deref(), Some("/admin/login"));

    let resp = test::call_service(&app, TestRequest::get().uri("/admin/login").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_unauthenticated_write_is_rejected_without_side_effects() {
    let env = common::setup().await;
    let app = init_app!(env.state);

    let req = TestRequest::post()
        .uri("/admin/link")
        .set_form([("title", "Sneaky"), ("url", "https://evil.example"), ("_csrf", "x")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp).as_deref(), Some("/admin/login"));

    assert!(env.state.links.list(ListFilter::All).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_forged_session_cookie_is_rejected() {
    let env = common::setup().await;
    let app = init_app!(env.state);

    let req = TestRequest::get()
        .uri("/admin")
        .cookie(actix_web::cookie::Cookie::new(SESSION_COOKIE_NAME, "not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_rt::test]
async fn test_login_with_wrong_password_rerenders_form() {
    let env = common::setup().await;
    let app = init_app!(env.state);

    let req = TestRequest::post()
        .uri("/admin/login")
        .set_form([("username", common::ADMIN_USERNAME), ("password", "wrong")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(common::session_cookie(&resp).is_none());

    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Invalid credentials"));
}

#[actix_rt::test]
async fn test_login_flow_and_csrf_protected_writes() {
    let env = common::setup().await;
    let app = init_app!(env.state);

    let req = TestRequest::post()
        .uri("/admin/login")
        .set_form([
            ("username", common::ADMIN_USERNAME),
            ("password", common::ADMIN_PASSWORD),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp).as_deref(), Some("/admin"));

    let cookie = common::session_cookie(&resp).expect("session cookie");
    assert_eq!(cookie.http_only(), Some(true));
    let csrf = common::csrf_token(&env.state, &cookie).await;

    // 后台页面内嵌 CSRF token
    let req = TestRequest::get().uri("/admin").cookie(cookie.clone()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-store")
    );
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains(&csrf));

    // 缺少 token
    let req = TestRequest::post()
        .uri("/admin/link")
        .cookie(cookie.clone())
        .set_form([("title", "Blog"), ("url", "https://blog.example")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // 错误 token
    let req = TestRequest::post()
        .uri("/admin/link")
        .cookie(cookie.clone())
        .set_form([("title", "Blog"), ("url", "https://blog.example"), ("_csrf", "bogus")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(env.state.links.list(ListFilter::All).await.unwrap().is_empty());

    // 表单字段中的 token
    let req = TestRequest::post()
        .uri("/admin/link")
        .cookie(cookie.clone())
        .set_form([
            ("title", "Blog"),
            ("url", "https://blog.example"),
            ("order_index", "2"),
            ("is_visible", "1"),
            ("_csrf", csrf.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp).as_deref(), Some("/admin"));

    let links = env.state.links.list(ListFilter::All).await.unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].title, "Blog");
    assert_eq!(links[0].order_index, 2);
    assert!(links[0].is_visible);

    // 请求头中的 token
    let id = links[0].id.to_string();
    let req = TestRequest::post()
        .uri("/admin/link/delete")
        .cookie(cookie.clone())
        .insert_header((CSRF_HEADER, csrf.as_str()))
        .set_form([("id", id.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(env.state.links.list(ListFilter::All).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_invalid_link_url_rerenders_dashboard() {
    let env = common::setup().await;
    let app = init_app!(env.state);
    let cookie = login!(app);
    let csrf = common::csrf_token(&env.state, &cookie).await;

    let req = TestRequest::post()
        .uri("/admin/link")
        .cookie(cookie)
        .set_form([("title", "Bad"), ("url", "javascript:alert(1)"), ("_csrf", csrf.as_str())])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(env.state.links.list(ListFilter::All).await.unwrap().is_empty());
}

#[actix_rt::test]
async fn test_redirect_admin_and_reserved_slug() {
    let env = common::setup().await;
    let app = init_app!(env.state);
    let cookie = login!(app);
    let csrf = common::csrf_token(&env.state, &cookie).await;

    let req = TestRequest::post()
        .uri("/admin/redirect")
        .cookie(cookie.clone())
        .set_form([
            ("slug", " /Promo/ "),
            ("target_url", "https://shop.example/sale"),
            ("is_active", "on"),
            ("_csrf", csrf.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let redirects = env.state.redirects.list().await.unwrap();
    assert_eq!(redirects.len(), 1);
    assert_eq!(redirects[0].slug, "promo");

    let req = TestRequest::post()
        .uri("/admin/redirect")
        .cookie(cookie)
        .set_form([
            ("slug", "admin"),
            ("target_url", "https://evil.example"),
            ("_csrf", csrf.as_str()),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(env.state.redirects.list().await.unwrap().len(), 1);
}

#[actix_rt::test]
async fn test_logout_destroys_session() {
    let env = common::setup().await;
    let app = init_app!(env.state);
    let cookie = login!(app);

    let req = TestRequest::post()
        .uri("/admin/logout")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp).as_deref(), Some("/admin/login"));

    let req = TestRequest::get().uri("/admin").cookie(cookie).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

const BOUNDARY: &str = "----linkhub-test-boundary";

/// 一个 multipart 字段：名称、可选的 (文件名, MIME)、内容
type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, &'a [u8]);

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file {
            Some((file_name, mime)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                    name, file_name, mime
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn settings_request(
    cookie: &actix_web::cookie::Cookie<'static>,
    csrf: Option<&str>,
    parts: &[Part<'_>],
) -> TestRequest {
    let uri = match csrf {
        Some(token) => format!(
            "/admin/settings?{}",
            serde_urlencoded::to_string([("_csrf", token)]).unwrap()
        ),
        None => "/admin/settings".to_string(),
    };
    TestRequest::post()
        .uri(&uri)
        .cookie(cookie.clone())
        .insert_header((
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}

#[actix_rt::test]
async fn test_settings_multipart_requires_csrf_query() {
    let env = common::setup().await;
    let app = init_app!(env.state);
    let cookie = login!(app);

    let req = settings_request(&cookie, None, &[("site_title", None, &b"Hijacked"[..])])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let title = env.state.settings.get("site_title").await.unwrap();
    assert_eq!(title.as_deref(), Some("LinkHub"));
}

#[actix_rt::test]
async fn test_settings_rejects_bad_uploads_without_saving() {
    let env = common::setup().await;
    let app = init_app!(env.state);
    let cookie = login!(app);
    let csrf = common::csrf_token(&env.state, &cookie).await;
    let before = env.state.settings.get_all().await.unwrap();

    // 超过 2 MiB
    let oversized = vec![0u8; 2 * 1024 * 1024 + 1];
    let req = settings_request(
        &cookie,
        Some(&csrf),
        &[
            ("site_title", None, &b"Changed"[..]),
            ("avatar", Some(("big.png", "image/png")), oversized.as_slice()),
        ],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // 非图片类型
    let req = settings_request(
        &cookie,
        Some(&csrf),
        &[
            ("site_title", None, &b"Changed"[..]),
            ("avatar", Some(("page.html", "text/html")), &b"<script>alert(1)</script>"[..]),
        ],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let settings = env.state.settings.get_all().await.unwrap();
    assert_eq!(settings.get("site_title").map(String::as_str), Some("LinkHub"));
    assert_eq!(settings.get("avatar_path"), before.get("avatar_path"));
    let uploads = Path::new(&env.state.config.server.static_dir).join("uploads");
    assert!(!uploads.join("avatar.png").exists());
    assert!(!uploads.join("avatar.html").exists());
}

#[actix_rt::test]
async fn test_settings_saves_fields_and_avatar_upload() {
    let env = common::setup().await;
    let app = init_app!(env.state);
    let cookie = login!(app);
    let csrf = common::csrf_token(&env.state, &cookie).await;

    let req = settings_request(
        &cookie,
        Some(&csrf),
        &[
            ("site_title", None, &b"  My Links  "[..]),
            ("not_a_setting", None, &b"ignored"[..]),
            ("avatar", Some(("Me.JPG", "image/jpeg")), &b"\xff\xd8\xff\xe0fake-jpeg"[..]),
            ("og_image_file", Some(("", "application/octet-stream")), &b""[..]),
        ],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(common::location(&resp).as_deref(), Some("/admin"));

    let settings = env.state.settings.get_all().await.unwrap();
    assert_eq!(settings.get("site_title").map(String::as_str), Some("My Links"));
    assert_eq!(
        settings.get("avatar_path").map(String::as_str),
        Some("/static/uploads/avatar.jpg")
    );
    assert!(!settings.contains_key("not_a_setting"));

    let stored = Path::new(&env.state.config.server.static_dir)
        .join("uploads")
        .join("avatar.jpg");
    assert_eq!(std::fs::read(stored).unwrap(), b"\xff\xd8\xff\xe0fake-jpeg");
}

#[actix_rt::test]
async fn test_login_attempts_are_rate_limited_per_client() {
    let env = common::setup().await;
    let app = init_app!(env.state);
    let max_attempts = env.state.config.login_limit.max_attempts;
    let attacker: SocketAddr = "203.0.113.7:40000".parse().unwrap();

    let attempt = |peer: SocketAddr, password: &'static str| {
        TestRequest::post()
            .uri("/admin/login")
            .peer_addr(peer)
            .set_form([("username", common::ADMIN_USERNAME), ("password", password)])
            .to_request()
    };

    for _ in 0..max_attempts {
        let resp = test::call_service(&app, attempt(attacker, "wrong")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    // 超限后即使密码正确也被拒绝
    let resp = test::call_service(&app, attempt(attacker, "wrong")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let resp = test::call_service(&app, attempt(attacker, common::ADMIN_PASSWORD)).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(common::session_cookie(&resp).is_none());

    // 其他客户端不受影响
    let other: SocketAddr = "198.51.100.9:40000".parse().unwrap();
    let resp = test::call_service(&app, attempt(other, common::ADMIN_PASSWORD)).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

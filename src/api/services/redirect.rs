//! 短链重定向兜底路由

use std::borrow::Cow;

use actix_web::http::header::LOCATION;
use actix_web::{HttpRequest, HttpResponse, web};
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::api::bad_request_response;
use crate::errors::Result;
use crate::state::AppState;

/// 解码路径中的百分号转义
///
/// `%` 后不是两位十六进制，或解码结果不是合法 UTF-8 时返回 `None`。
pub fn decode_path(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let well_formed = bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'%')
        .all(|(i, _)| {
            bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
        });
    if !well_formed {
        return None;
    }

    percent_decode_str(raw).decode_utf8().ok().map(Cow::into_owned)
}

/// GET /{slug}
///
/// 命中启用的 redirect 时 302 跳转，否则渲染 404 页面。
pub async fn resolve_slug(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let raw = req.uri().path().trim_start_matches('/');
    let Some(segment) = decode_path(raw) else {
        debug!("Malformed percent-encoding in path: {}", raw);
        return Ok(bad_request_response());
    };

    match state.redirects.resolve(&segment).await? {
        Some(target) => {
            debug!("Redirecting /{} -> {}", segment, target);
            Ok(HttpResponse::Found()
                .insert_header((LOCATION, target))
                .finish())
        }
        None => Ok(state.renderer.not_found()),
    }
}

/// 所有未匹配的请求
pub async fn not_found(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    if decode_path(req.uri().path()).is_none() {
        debug!("Malformed percent-encoding in path: {}", req.uri().path());
        return bad_request_response();
    }
    state.renderer.not_found()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("foo").as_deref(), Some("foo"));
        assert_eq!(decode_path("caf%C3%A9").as_deref(), Some("café"));
        assert_eq!(decode_path("a%20b").as_deref(), Some("a b"));
        assert!(decode_path("%ff").is_none());
        assert!(decode_path("%E0%A4%A").is_none());
        assert!(decode_path("abc%zz").is_none());
        assert!(decode_path("100%").is_none());
    }
}

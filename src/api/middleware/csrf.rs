//! CSRF 防护中间件
//!
//! 会话中保存一个随机 token，状态变更请求必须回传同一个值。
//!
//! token 来源（按顺序）：
//! - `X-CSRF-Token` header
//! - `_csrf` 查询参数（multipart 表单使用）
//! - urlencoded 表单中的 `_csrf` 字段
//!
//! 跳过规则：
//! - 安全方法（GET, HEAD, OPTIONS）
//! - 登录、登出端点

use std::pin::Pin;
use std::rc::Rc;

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    error::PayloadError,
    http::{Method, header::CONTENT_TYPE},
    web::Bytes,
};
use futures_util::Stream;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use subtle::ConstantTimeEq;
use tracing::{trace, warn};

use crate::api::constants::{CSRF_FIELD, CSRF_HEADER, LOGIN_PATH, LOGOUT_PATH};

use super::auth::AdminSession;

/// CSRF 防护中间件，必须位于 `AdminAuth` 之内
#[derive(Clone, Default)]
pub struct CsrfGuard;

impl<S, B> Transform<S, ServiceRequest> for CsrfGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct CsrfMiddleware<S> {
    service: Rc<S>,
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn form_field(body: &[u8], field: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == field)
        .map(|(_, value)| value.into_owned())
}

fn is_urlencoded(req: &ServiceRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// 把已读取的请求体放回请求，供后续 extractor 使用
fn restore_payload(req: &mut ServiceRequest, body: Bytes) {
    let stream: Pin<Box<dyn Stream<Item = Result<Bytes, PayloadError>>>> =
        Box::pin(futures_util::stream::once(async move { Ok(body) }));
    req.set_payload(Payload::Stream { payload: stream });
}

impl<S, B> CsrfMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    fn handle_csrf_error(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        warn!("CSRF validation failed for {} {}", req.method(), req.path());
        req.into_response(
            HttpResponse::Forbidden()
                .content_type("text/plain; charset=utf-8")
                .body("Invalid CSRF token")
                .map_into_right_body(),
        )
    }

    fn is_safe_method(method: &Method) -> bool {
        matches!(method, &Method::GET | &Method::HEAD | &Method::OPTIONS)
    }

    fn is_auth_endpoint(path: &str) -> bool {
        path == LOGIN_PATH || path == LOGOUT_PATH
    }

    fn header_or_query_token(req: &ServiceRequest) -> Option<String> {
        let header = req
            .headers()
            .get(CSRF_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());
        header.or_else(|| form_field(req.query_string().as_bytes(), CSRF_FIELD))
    }
}

impl<S, B> Service<ServiceRequest> for CsrfMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            if Self::is_safe_method(req.method()) || Self::is_auth_endpoint(req.path()) {
                trace!("CSRF skipped: {} {}", req.method(), req.path());
                let response = srv.call(req).await?.map_into_left_body();
                return Ok(response);
            }

            let expected = req
                .extensions()
                .get::<AdminSession>()
                .map(|s| s.csrf_token.clone());
            let Some(expected) = expected else {
                warn!("CSRF check without an authenticated session");
                return Ok(Self::handle_csrf_error(req));
            };

            let mut submitted = Self::header_or_query_token(&req);
            if submitted.is_none() && is_urlencoded(&req) {
                let body = req.extract::<Bytes>().await?;
                submitted = form_field(&body, CSRF_FIELD);
                restore_payload(&mut req, body);
            }

            match submitted {
                Some(token) if constant_time_compare(&token, &expected) => {
                    trace!("CSRF validation passed");
                    let response = srv.call(req).await?.map_into_left_body();
                    Ok(response)
                }
                _ => Ok(Self::handle_csrf_error(req)),
            }
        })
    }
}

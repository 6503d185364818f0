//! 管理后台认证中间件
//!
//! 从会话 Cookie 中校验签名 token，再从会话存储加载会话。
//! 未认证的请求一律 302 到登录页，handler 不会被调用。

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::{CACHE_CONTROL, LOCATION},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, error, trace};

use crate::api::constants::{LOGIN_PATH, LOGOUT_PATH, SESSION_COOKIE_NAME};
use crate::state::AppState;

/// 已认证的管理员会话，handler 通过 `web::ReqData<AdminSession>` 获取
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub session_id: String,
    pub user_id: i32,
    pub csrf_token: String,
}

/// Admin authentication middleware
#[derive(Clone, Default)]
pub struct AdminAuth;

impl<S, B> Transform<S, ServiceRequest> for AdminAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AdminAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> AdminAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    fn redirect_to_login(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        debug!("Unauthenticated request to {} redirected to login", req.path());
        req.into_response(
            HttpResponse::Found()
                .insert_header((LOCATION, LOGIN_PATH))
                .insert_header((CACHE_CONTROL, "no-store"))
                .finish()
                .map_into_right_body(),
        )
    }

    fn internal_error(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
        req.into_response(
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body("Internal Server Error")
                .map_into_right_body(),
        )
    }

    /// 登录、登出端点不需要已有会话
    fn is_public_endpoint(path: &str) -> bool {
        path == LOGIN_PATH || path == LOGOUT_PATH
    }
}

impl<S, B> Service<ServiceRequest> for AdminAuthMiddleware<S>
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

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            if Self::is_public_endpoint(req.path()) {
                trace!("Auth endpoint accessed - bypassing session check");
                let response = srv.call(req).await?.map_into_left_body();
                return Ok(response);
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                error!("AppState missing from app data");
                return Ok(Self::internal_error(req));
            };

            let Some(token) = req.cookie(SESSION_COOKIE_NAME).map(|c| c.value().to_string())
            else {
                return Ok(Self::redirect_to_login(req));
            };

            let session_id = match state.tokens.verify(&token) {
                Ok(sid) => sid,
                Err(e) => {
                    debug!("Session token rejected: {}", e);
                    return Ok(Self::redirect_to_login(req));
                }
            };

            match state.auth.current_session(&session_id).await {
                Ok(Some(session)) => {
                    trace!("Admin session {} authenticated", session.id);
                    req.extensions_mut().insert(AdminSession {
                        session_id: session.id,
                        user_id: session.user_id,
                        csrf_token: session.csrf_token,
                    });
                    let response = srv.call(req).await?.map_into_left_body();
                    Ok(response)
                }
                Ok(None) => Ok(Self::redirect_to_login(req)),
                Err(e) => {
                    error!("Failed to load session: {}", e);
                    Ok(Self::internal_error(req))
                }
            }
        })
    }
}

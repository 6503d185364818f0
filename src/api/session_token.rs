//! 会话 Cookie
//!
//! Cookie 中保存一个 HS256 签名的短 token，里面只有会话 id 与过期时间；
//! 会话本身（用户、CSRF token）存放在 `SessionStore` 中。

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::constants::SESSION_COOKIE_NAME;
use crate::config::SessionConfig;
use crate::errors::Result;
use crate::repository::SessionData;
use crate::utils::generate_secure_token;

const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: String,
    pub iat: i64,
    pub exp: i64,
}

pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cookie_secure: bool,
    ttl_days: u64,
}

impl SessionTokenService {
    pub fn new(secret: &str, cookie_secure: bool, ttl_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            cookie_secure,
            ttl_days,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        let secret = if config.secret.is_empty() {
            warn!("Session secret not configured, generating a per-process key; sessions will not survive restarts");
            generate_secure_token()
        } else {
            if config.secret.len() < MIN_SECRET_LEN {
                warn!(
                    "Session secret is shorter than {} bytes, consider a longer one",
                    MIN_SECRET_LEN
                );
            }
            config.secret.clone()
        };

        Self::new(&secret, config.cookie_secure, config.ttl_days)
    }

    pub fn issue(&self, session: &SessionData) -> Result<String> {
        let claims = SessionClaims {
            sid: session.id.clone(),
            iat: Utc::now().timestamp(),
            exp: session.expires_at.timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// 校验签名与过期时间，返回会话 id
    pub fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims.sid)
    }

    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_secure(self.cookie_secure);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_max_age(CookieDuration::days(self.ttl_days as i64));
        cookie
    }

    pub fn expired_cookie(&self) -> Cookie<'static> {
        let mut cookie = self.session_cookie(String::new());
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration) -> SessionData {
        SessionData {
            id: "sid-123".to_string(),
            user_id: 1,
            csrf_token: "csrf".to_string(),
            expires_at: Utc::now() + expires_in,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = SessionTokenService::new("a-very-long-secret-for-testing-only!", false, 7);
        let token = service.issue(&session(Duration::days(1))).unwrap();
        assert_eq!(service.verify(&token).unwrap(), "sid-123");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let a = SessionTokenService::new("secret-a-secret-a-secret-a-secret-a", false, 7);
        let b = SessionTokenService::new("secret-b-secret-b-secret-b-secret-b", false, 7);
        let token = a.issue(&session(Duration::days(1))).unwrap();
        assert!(b.verify(&token).is_err());
        assert!(a.verify("garbage").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = SessionTokenService::new("a-very-long-secret-for-testing-only!", false, 7);
        let token = service.issue(&session(Duration::hours(-2))).unwrap();
        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn test_cookie_attributes() {
        let service = SessionTokenService::new("s", true, 7);
        let cookie = service.session_cookie("t".to_string());
        assert_eq!(cookie.name(), "linkhub.sid");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(CookieDuration::days(7)));
    }
}

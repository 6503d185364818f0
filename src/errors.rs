use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use tracing::error;

#[derive(Debug, Clone)]
pub enum LinkhubError {
    Config(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    Unauthorized(String),
    Session(String),
    Template(String),
    Serialization(String),
}

impl LinkhubError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkhubError::Config(_) => "E001",
            LinkhubError::DatabaseConfig(_) => "E003",
            LinkhubError::DatabaseConnection(_) => "E004",
            LinkhubError::DatabaseOperation(_) => "E005",
            LinkhubError::FileOperation(_) => "E006",
            LinkhubError::Validation(_) => "E007",
            LinkhubError::NotFound(_) => "E008",
            LinkhubError::Serialization(_) => "E009",
            LinkhubError::Unauthorized(_) => "E010",
            LinkhubError::Session(_) => "E011",
            LinkhubError::Template(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkhubError::Config(_) => "Configuration Error",
            LinkhubError::DatabaseConfig(_) => "Database Configuration Error",
            LinkhubError::DatabaseConnection(_) => "Database Connection Error",
            LinkhubError::DatabaseOperation(_) => "Database Operation Error",
            LinkhubError::FileOperation(_) => "File Operation Error",
            LinkhubError::Validation(_) => "Validation Error",
            LinkhubError::NotFound(_) => "Resource Not Found",
            LinkhubError::Unauthorized(_) => "Unauthorized",
            LinkhubError::Session(_) => "Session Error",
            LinkhubError::Template(_) => "Template Error",
            LinkhubError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkhubError::Config(msg)
            | LinkhubError::DatabaseConfig(msg)
            | LinkhubError::DatabaseConnection(msg)
            | LinkhubError::DatabaseOperation(msg)
            | LinkhubError::FileOperation(msg)
            | LinkhubError::Validation(msg)
            | LinkhubError::NotFound(msg)
            | LinkhubError::Unauthorized(msg)
            | LinkhubError::Session(msg)
            | LinkhubError::Template(msg)
            | LinkhubError::Serialization(msg) => msg,
        }
    }

    /// 格式化为简洁输出（用于 CLI）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LinkhubError::Validation(_) | LinkhubError::NotFound(_) | LinkhubError::Unauthorized(_)
        )
    }
}

impl fmt::Display for LinkhubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkhubError {}

// 便捷的构造函数
impl LinkhubError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        LinkhubError::Config(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkhubError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkhubError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkhubError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        LinkhubError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkhubError::Validation(msg.into())
    }

    pub fn session<T: Into<String>>(msg: T) -> Self {
        LinkhubError::Session(msg.into())
    }

    pub fn template<T: Into<String>>(msg: T) -> Self {
        LinkhubError::Template(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkhubError::Serialization(msg.into())
    }
}

/// 4xx 返回原始消息；5xx 只记录日志，对外返回通用错误页
impl ResponseError for LinkhubError {
    fn status_code(&self) -> StatusCode {
        match self {
            LinkhubError::Validation(_) => StatusCode::BAD_REQUEST,
            LinkhubError::NotFound(_) => StatusCode::NOT_FOUND,
            LinkhubError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if self.is_client_error() {
            return HttpResponse::build(status)
                .content_type("text/plain; charset=utf-8")
                .body(self.message().to_string());
        }

        error!("{} [{}]: {}", self.error_type(), self.code(), self.message());
        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body("Internal Server Error")
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LinkhubError {
    fn from(err: sea_orm::DbErr) -> Self {
        LinkhubError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for LinkhubError {
    fn from(err: std::io::Error) -> Self {
        LinkhubError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkhubError {
    fn from(err: serde_json::Error) -> Self {
        LinkhubError::Serialization(err.to_string())
    }
}

impl From<tera::Error> for LinkhubError {
    fn from(err: tera::Error) -> Self {
        // tera 的 Display 只给出最外层信息，补上 source 链
        let mut msg = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            msg.push_str(": ");
            msg.push_str(&inner.to_string());
            source = inner.source();
        }
        LinkhubError::Template(msg)
    }
}

impl From<config::ConfigError> for LinkhubError {
    fn from(err: config::ConfigError) -> Self {
        LinkhubError::Config(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for LinkhubError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        LinkhubError::Session(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkhubError>;

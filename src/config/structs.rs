use serde::{Deserialize, Serialize};

/// 应用配置（启动时加载一次，之后只读）
///
/// 包含：
/// - server: 监听地址、worker 数、静态目录、可信代理
/// - database: 数据库连接
/// - admin / session: 管理员账户与会话
/// - site: 公共域名
/// - login_limit / uploads: 登录限流与上传限制
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub login_limit: LoginLimitConfig,
    #[serde(default)]
    pub uploads: UploadConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub workers: usize,
    /// Directory served under `/static`; uploads land in `<static_dir>/uploads`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// IPs or CIDRs whose forwarding headers are trusted.
    #[serde(default)]
    pub trusted_proxies: Vec<String>,
    #[serde(default)]
    pub enable_debug_routes: bool,
}

/// 数据库连接配置
///
/// `url` 优先；否则当 `name` 非空时拼出 MySQL URL；否则使用本地 SQLite。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_database_host")]
    pub host: String,
    #[serde(default = "default_database_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// Used only when the admin account is first created. Empty means generate one.
    #[serde(default)]
    pub password: String,
    /// Argon2 iteration count (t_cost).
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Signing key for the session cookie. Empty means a random per-process key.
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_session_ttl_days")]
    pub ttl_days: u64,
    #[serde(default)]
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_public_domain")]
    pub public_domain: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginLimitConfig {
    #[serde(default = "default_login_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_login_window_secs")]
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_upload_max_bytes")]
    pub max_bytes: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    3000
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_static_dir() -> String {
    "./public".to_string()
}

fn default_database_host() -> String {
    "localhost".to_string()
}

fn default_database_port() -> u16 {
    3306
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    8
}

fn default_admin_username() -> String {
    "admin".to_string()
}

pub(crate) fn default_password_hash_cost() -> u32 {
    2
}

fn default_session_ttl_days() -> u64 {
    7
}

fn default_public_domain() -> String {
    "example.com".to_string()
}

fn default_login_max_attempts() -> u32 {
    20
}

fn default_login_window_secs() -> u64 {
    15 * 60
}

fn default_upload_max_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_cpu_count(),
            static_dir: default_static_dir(),
            trusted_proxies: Vec::new(),
            enable_debug_routes: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            host: default_database_host(),
            port: default_database_port(),
            user: String::new(),
            password: String::new(),
            name: String::new(),
            pool_size: default_database_pool_size(),
            connect_timeout_secs: default_database_timeout(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: String::new(),
            password_hash_cost: default_password_hash_cost(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_days: default_session_ttl_days(),
            cookie_secure: false,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_domain: default_public_domain(),
        }
    }
}

impl Default for LoginLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_login_max_attempts(),
            window_secs: default_login_window_secs(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_upload_max_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

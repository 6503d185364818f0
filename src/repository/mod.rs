//! 数据访问层
//!
//! 每个仓库持有一个 `DatabaseConnection`（内部是连接池，clone 开销很小），
//! 所有写操作都是单条自动提交语句。

pub mod counters;
pub mod embeds;
pub mod links;
pub mod redirects;
pub mod sessions;
pub mod settings;
pub mod users;

pub use counters::{CounterRepository, LikeOutcome};
pub use embeds::{Embed, EmbedRecord, EmbedRepository};
pub use links::{Link, LinkRecord, LinkRepository};
pub use redirects::{Redirect, RedirectRecord, RedirectRepository};
pub use sessions::{SeaOrmSessionStore, SessionData, SessionStore};
pub use settings::{SettingKey, SettingsStore};
pub use users::{User, UserRepository};

/// 列表过滤条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    /// Only rows whose visibility (or, for redirects, active) flag is set.
    VisibleOnly,
}

pub mod embed;
pub mod like;
pub mod link;
pub mod metric;
pub mod redirect;
pub mod session;
pub mod setting;
pub mod user;

pub use embed::Entity as EmbedEntity;
pub use like::Entity as LikeEntity;
pub use link::Entity as LinkEntity;
pub use metric::Entity as MetricEntity;
pub use redirect::Entity as RedirectEntity;
pub use session::Entity as SessionEntity;
pub use setting::Entity as SettingEntity;
pub use user::Entity as UserEntity;

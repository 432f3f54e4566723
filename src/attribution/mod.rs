//! Affiliate attribution core
//!
//! - `resolver`: URL/Cookie 解析、Cookie 刷新、购物页通知
//! - `cookie_store`: Cookie 存储抽象
//! - `notifier`: fire-and-forget 通知
//! - `session`: 捕获端点使用的归因会话

pub mod cookie_store;
pub mod identifier;
pub mod notifier;
pub mod page;
pub mod resolver;
pub mod session;

pub use cookie_store::{CookieStore, MemoryCookieStore, StoredCookie, parse_cookie_header};
pub use identifier::AffiliateKey;
pub use notifier::{
    AttributionNotifier, HttpNotifier, LogNotifier, Notification, SessionNotifier, build_notifier,
    dispatch_notification,
};
pub use page::PageUrl;
pub use resolver::{AttributionResolver, KeySource, Resolution};
pub use session::{AttributionSessions, SessionEntry, new_session_id};

//! 推广归因解析器
//!
//! 每次页面加载运行一次：
//! 1. 按别名顺序读取 URL 参数，取第一个非空值
//! 2. 否则读取归因 Cookie
//! 3. 都没有则不做任何事
//!
//! 标识来自 URL 时重写 Cookie 并重置有效期；只来自 Cookie 时不改动 Cookie。
//! 处于购物流程的页面额外发送一次后台通知。

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::notifier::{AttributionNotifier, Notification, dispatch_notification};
use super::{AffiliateKey, CookieStore, PageUrl};
use crate::config::AttributionConfig;

/// 标识来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// 命中的 query 参数名
    Query(String),
    Cookie,
}

/// 一次解析的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// 没有找到标识，未产生副作用
    NoOp,
    Persisted {
        key: AffiliateKey,
        source: KeySource,
        cookie_written: bool,
        notified: bool,
    },
}

impl Resolution {
    pub fn key(&self) -> Option<&AffiliateKey> {
        match self {
            Resolution::NoOp => None,
            Resolution::Persisted { key, .. } => Some(key),
        }
    }
}

pub struct AttributionResolver {
    config: AttributionConfig,
    notifier: Arc<dyn AttributionNotifier>,
}

impl AttributionResolver {
    pub fn new(config: AttributionConfig, notifier: Arc<dyn AttributionNotifier>) -> Self {
        Self { config, notifier }
    }

    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    pub fn is_shop_page(&self, page: &PageUrl) -> bool {
        self.config.is_shop_path(page.path())
    }

    /// 只解析，不产生副作用
    pub fn resolve(&self, page: &PageUrl, store: &dyn CookieStore) -> Option<(AffiliateKey, KeySource)> {
        for alias in &self.config.param_aliases {
            if let Some(key) = page
                .query_param(alias)
                .as_deref()
                .and_then(AffiliateKey::parse)
            {
                return Some((key, KeySource::Query(alias.clone())));
            }
        }

        store
            .get(&self.config.cookie_name)
            .as_deref()
            .and_then(AffiliateKey::parse)
            .map(|key| (key, KeySource::Cookie))
    }

    /// 解析并持久化，通知在后台发送，调用方不会看到通知的结果
    pub fn resolve_and_persist(&self, page: &PageUrl, store: &mut dyn CookieStore) -> Resolution {
        let (resolution, _detached) = self.resolve_and_dispatch(page, store);
        resolution
    }

    /// 与 `resolve_and_persist` 相同，但返回后台通知任务的句柄
    ///
    /// 用于进程即将退出、需要等待通知完成的场景（CLI）。
    pub fn resolve_and_dispatch(
        &self,
        page: &PageUrl,
        store: &mut dyn CookieStore,
    ) -> (Resolution, Option<JoinHandle<()>>) {
        let Some((key, source)) = self.resolve(page, store) else {
            trace!("No affiliate key on {}", page.path());
            return (Resolution::NoOp, None);
        };

        let cookie_written = match source {
            KeySource::Query(_) => self.refresh_cookie(&key, store),
            KeySource::Cookie => false,
        };

        let handle = if self.is_shop_page(page) {
            let notification = Notification {
                key: key.clone(),
                session: store.get(&self.config.session_cookie_name),
            };
            dispatch_notification(self.notifier.clone(), notification)
        } else {
            None
        };

        debug!(
            "Resolved affiliate key {} from {:?} on {} (cookie_written={}, notified={})",
            key,
            source,
            page.path(),
            cookie_written,
            handle.is_some()
        );

        let resolution = Resolution::Persisted {
            key,
            source,
            cookie_written,
            notified: handle.is_some(),
        };
        (resolution, handle)
    }

    /// 写入失败只记录日志，不影响通知
    fn refresh_cookie(&self, key: &AffiliateKey, store: &mut dyn CookieStore) -> bool {
        match store.set(&self.config.cookie_name, key.as_str(), self.config.retention()) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Failed to write attribution cookie {}: {}",
                    self.config.cookie_name, e
                );
                false
            }
        }
    }
}

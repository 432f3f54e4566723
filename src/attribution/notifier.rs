//! 归因通知
//!
//! 通知是 fire-and-forget：在后台任务中发送，结果只记日志，从不返回给调用方。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use ureq::Agent;

use super::{AffiliateKey, AttributionSessions};
use crate::config::{AttributionConfig, NotifierKind};
use crate::errors::{AttributionError, Result};

/// 一次页面加载产生的通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub key: AffiliateKey,
    /// 访客会话 ID（如果已知）
    pub session: Option<String>,
}

#[async_trait]
pub trait AttributionNotifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;

    fn name(&self) -> &'static str;
}

/// 在当前 Tokio runtime 上后台发送通知
///
/// 返回的 `JoinHandle` 可以直接丢弃，丢弃不会取消任务。没有 runtime 时通知被丢弃。
pub fn dispatch_notification(
    notifier: Arc<dyn AttributionNotifier>,
    notification: Notification,
) -> Option<JoinHandle<()>> {
    let handle = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!(
                "No async runtime available, dropping attribution notification for {}",
                notification.key
            );
            return None;
        }
    };

    Some(handle.spawn(async move {
        match notifier.notify(&notification).await {
            Ok(()) => trace!(
                "Attribution notification for {} delivered via {}",
                notification.key,
                notifier.name()
            ),
            Err(e) => warn!(
                "Attribution notification for {} via {} failed: {}",
                notification.key,
                notifier.name(),
                e
            ),
        }
    }))
}

/// 根据配置构建通知器
pub fn build_notifier(
    config: &AttributionConfig,
    sessions: Arc<AttributionSessions>,
) -> Result<Arc<dyn AttributionNotifier>> {
    let notifier: Arc<dyn AttributionNotifier> = match config.notifier {
        NotifierKind::Http => Arc::new(HttpNotifier::from_config(config)?),
        NotifierKind::Local => Arc::new(SessionNotifier::new(sessions)),
        NotifierKind::Log => Arc::new(LogNotifier),
    };
    info!("Attribution notifier: {}", notifier.name());
    Ok(notifier)
}

/// 通过 HTTP POST 把标识发给外部归因端点
///
/// 每个通知器持有自己的 Agent（ureq 的 Agent 是 Send + Sync，clone 共享连接池），
/// 超时取自构建时的配置。
pub struct HttpNotifier {
    agent: Agent,
    endpoint: String,
    payload_field: String,
    session_cookie_name: String,
}

impl HttpNotifier {
    pub fn from_config(config: &AttributionConfig) -> Result<Self> {
        let endpoint = url::Url::parse(&config.endpoint_url)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AttributionError::config(format!(
                "attribution.endpoint_url must be http(s), got '{}'",
                config.endpoint_url
            )));
        }

        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(config.notify_timeout()))
            .build()
            .into();

        Ok(Self {
            agent,
            endpoint: endpoint.to_string(),
            payload_field: config.payload_field.clone(),
            session_cookie_name: config.session_cookie_name.clone(),
        })
    }

    /// 请求体：`{ <payload_field>: key }`
    pub fn payload(&self, notification: &Notification) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.payload_field.clone(),
            serde_json::Value::String(notification.key.as_str().to_string()),
        );
        serde_json::Value::Object(body)
    }

    /// 同步发送（在 spawn_blocking 中调用）
    fn post_sync(
        agent: &Agent,
        endpoint: &str,
        body: &serde_json::Value,
        cookie: Option<&str>,
    ) -> Result<()> {
        let mut request = agent.post(endpoint);
        if let Some(cookie) = cookie {
            request = request.header("Cookie", cookie);
        }

        let response = request.send_json(body)?;
        trace!(
            "Attribution endpoint {} answered {}",
            endpoint,
            response.status()
        );
        Ok(())
    }
}

#[async_trait]
impl AttributionNotifier for HttpNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let body = self.payload(notification);
        let cookie = notification
            .session
            .as_ref()
            .map(|session| format!("{}={}", self.session_cookie_name, session));

        // 使用 spawn_blocking 在线程池中执行同步 HTTP 请求
        tokio::task::spawn_blocking(move || {
            Self::post_sync(&agent, &endpoint, &body, cookie.as_deref())
        })
        .await??;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// 直接写入进程内的归因会话
pub struct SessionNotifier {
    sessions: Arc<AttributionSessions>,
}

impl SessionNotifier {
    pub fn new(sessions: Arc<AttributionSessions>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl AttributionNotifier for SessionNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let Some(ref session) = notification.session else {
            return Err(AttributionError::notification("no_session").into());
        };
        self.sessions.record(session, notification.key.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// 只记录日志
pub struct LogNotifier;

#[async_trait]
impl AttributionNotifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(
            key = %notification.key,
            session = ?notification.session,
            "Attribution notification"
        );
        debug!("LogNotifier does not deliver notifications anywhere");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

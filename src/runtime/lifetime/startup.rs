use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::attribution::{AttributionResolver, AttributionSessions, build_notifier};
use crate::config::AttributionConfig;

/// 服务器与 CLI 共用的归因组件
pub struct StartupContext {
    pub sessions: Arc<AttributionSessions>,
    pub resolver: Arc<AttributionResolver>,
}

/// 根据配置构建会话存储、通知器和解析器
pub fn prepare_components(config: &AttributionConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Preparing attribution components...");

    let sessions = Arc::new(AttributionSessions::from_config(config));
    let notifier =
        build_notifier(config, sessions.clone()).context("Failed to build attribution notifier")?;
    let resolver = Arc::new(AttributionResolver::new(config.clone(), notifier));

    info!(
        "Attribution ready: cookie={}, aliases={:?}, shop_prefix={}, retention={}d",
        config.cookie_name, config.param_aliases, config.shop_prefix, config.retention_days
    );
    debug!("Components prepared in {:?}", start_time.elapsed());

    Ok(StartupContext { sessions, resolver })
}

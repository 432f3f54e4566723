//! 归因会话
//!
//! 捕获端点把访客会话 ID 映射到最后一次捕获的推广标识，条目在保留期后过期。

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use serde::Serialize;
use tracing::debug;

use super::AffiliateKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEntry {
    pub key: AffiliateKey,
    pub captured_at: DateTime<Utc>,
}

pub struct AttributionSessions {
    cache: Cache<String, SessionEntry>,
}

impl AttributionSessions {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        Self { cache }
    }

    pub fn from_config(config: &crate::config::AttributionConfig) -> Self {
        Self::new(config.retention(), config.session_capacity)
    }

    /// 记录会话的推广标识，新值覆盖旧值
    pub fn record(&self, session_id: &str, key: AffiliateKey) -> SessionEntry {
        let entry = SessionEntry {
            key,
            captured_at: Utc::now(),
        };
        debug!(
            "Attribution session {} now carries key {}",
            session_id, entry.key
        );
        self.cache.insert(session_id.to_string(), entry.clone());
        entry
    }

    pub fn get(&self, session_id: &str) -> Option<SessionEntry> {
        self.cache.get(session_id)
    }
}

/// 生成新的会话 ID
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> AffiliateKey {
        AffiliateKey::parse(raw).unwrap()
    }

    #[test]
    fn test_record_and_get() {
        let sessions = AttributionSessions::new(Duration::from_secs(60), 100);
        sessions.record("s1", key("ABC"));

        let entry = sessions.get("s1").unwrap();
        assert_eq!(entry.key.as_str(), "ABC");
        assert!(sessions.get("s2").is_none());
    }

    #[test]
    fn test_newest_capture_wins() {
        let sessions = AttributionSessions::new(Duration::from_secs(60), 100);
        sessions.record("s1", key("FIRST"));
        sessions.record("s1", key("SECOND"));
        assert_eq!(sessions.get("s1").unwrap().key.as_str(), "SECOND");
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }
}

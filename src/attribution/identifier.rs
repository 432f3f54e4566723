//! 推广标识（affiliate key）

use std::fmt;

use serde::Serialize;

/// 推广者标识，保证去除首尾空白后非空
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AffiliateKey(String);

impl AffiliateKey {
    /// 去除首尾空白，空值视为不存在
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// 服务端入口使用的严格形式：只保留 ASCII 字母数字、'-' 和 '_'，并截断到 `max_len`
    pub fn normalize(raw: &str, max_len: usize) -> Option<Self> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(max_len)
            .collect();

        if cleaned.is_empty() {
            None
        } else {
            Some(Self(cleaned))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for AffiliateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AffiliateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_rejects_blank() {
        assert_eq!(AffiliateKey::parse("  ABC123 ").unwrap().as_str(), "ABC123");
        assert!(AffiliateKey::parse("").is_none());
        assert!(AffiliateKey::parse(" \t\n").is_none());
    }

    #[test]
    fn test_parse_keeps_inner_characters() {
        let key = AffiliateKey::parse("partner #7/eu").unwrap();
        assert_eq!(key.as_str(), "partner #7/eu");
    }

    #[test]
    fn test_normalize_strips_unsafe_characters() {
        let key = AffiliateKey::normalize(" AB#C-1_2 ", 64).unwrap();
        assert_eq!(key.as_str(), "ABC-1_2");
    }

    #[test]
    fn test_normalize_truncates() {
        let raw = "a".repeat(100);
        let key = AffiliateKey::normalize(&raw, 64).unwrap();
        assert_eq!(key.as_str().len(), 64);
    }

    #[test]
    fn test_normalize_rejects_when_nothing_survives() {
        assert!(AffiliateKey::normalize("<script>", 64).is_some());
        assert!(AffiliateKey::normalize("<>!!", 64).is_none());
        assert!(AffiliateKey::normalize("üé", 64).is_none());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let key = AffiliateKey::parse("XYZ").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"XYZ\"");
    }
}

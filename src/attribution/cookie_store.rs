//! Cookie 存储抽象
//!
//! 解析器只通过 `CookieStore` 读写 Cookie，浏览器 Cookie 罐、HTTP 请求头、
//! 测试用内存存储都实现同一个接口。

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::errors::Result;

/// 键值式 Cookie 存储
///
/// `get` 返回解码后的值；`set` 接收未编码的值，编码由实现负责。
pub trait CookieStore {
    fn get(&self, name: &str) -> Option<String>;

    fn set(&mut self, name: &str, value: &str, ttl: Duration) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// 内存 Cookie 存储，过期条目读取时视为不存在
#[derive(Debug, Default, Clone)]
pub struct MemoryCookieStore {
    cookies: HashMap<String, StoredCookie>,
    writes: usize,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个 Cookie，不计入写入次数
    pub fn with_cookie(mut self, name: &str, value: &str, expires_at: DateTime<Utc>) -> Self {
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires_at,
            },
        );
        self
    }

    pub fn entry(&self, name: &str) -> Option<&StoredCookie> {
        self.cookies
            .get(name)
            .filter(|cookie| cookie.expires_at > Utc::now())
    }

    pub fn expires_at(&self, name: &str) -> Option<DateTime<Utc>> {
        self.entry(name).map(|cookie| cookie.expires_at)
    }

    /// 通过 `set` 写入的次数
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.entry(name).map(|cookie| cookie.value.clone())
    }

    fn set(&mut self, name: &str, value: &str, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| crate::errors::AttributionError::cookie_write(e.to_string()))?;
        self.cookies.insert(
            name.to_string(),
            StoredCookie {
                value: value.to_string(),
                expires_at: Utc::now() + ttl,
            },
        );
        self.writes += 1;
        Ok(())
    }
}

/// 解析 `Cookie` 请求头（`a=1; b=2`），值做百分号解码
///
/// 同名 Cookie 以第一个为准，与浏览器发送顺序一致。
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split(';') {
        let Some((name, value)) = pair.trim().split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || cookies.contains_key(name) {
            continue;
        }
        let value = value.trim().trim_matches('"');
        let decoded = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        cookies.insert(name.to_string(), decoded);
    }
    cookies
}

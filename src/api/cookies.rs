//! 请求级 Cookie 罐
//!
//! 把 HTTP 请求的 `Cookie` 头适配为 `CookieStore`，写入先暂存，
//! 响应返回时再统一追加为 `Set-Cookie`。

use std::collections::HashMap;
use std::time::Duration;

use actix_web::HttpRequest;
use actix_web::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::{self, HeaderMap, HeaderValue};
use tracing::warn;

use crate::attribution::{CookieStore, new_session_id, parse_cookie_header};
use crate::config::{AttributionConfig, SameSitePolicy};
use crate::errors::{AttributionError, Result};

/// Cookie 构建器，统一 path / SameSite / Secure / Domain
#[derive(Debug, Clone)]
pub struct CookieBuilder {
    same_site: SameSite,
    secure: bool,
    domain: Option<String>,
}

impl CookieBuilder {
    pub fn from_config(config: &AttributionConfig) -> Self {
        let same_site = match config.same_site {
            SameSitePolicy::Strict => SameSite::Strict,
            SameSitePolicy::None => SameSite::None,
            SameSitePolicy::Lax => SameSite::Lax,
        };

        Self {
            same_site,
            // SameSite=None 必须带 Secure，否则浏览器直接丢弃
            secure: config.cookie_secure || config.same_site == SameSitePolicy::None,
            domain: config.cookie_domain.clone(),
        }
    }

    fn build_cookie_base(&self, name: &str, value: &str) -> Cookie<'static> {
        let mut cookie = Cookie::new(name.to_string(), urlencoding::encode(value).into_owned());
        cookie.set_path("/");
        cookie.set_secure(self.secure);
        cookie.set_same_site(self.same_site);
        if let Some(ref domain) = self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }

    /// 归因 Cookie：前端脚本也需要读取，不设 HttpOnly
    pub fn build_attribution_cookie(
        &self,
        name: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<Cookie<'static>> {
        let seconds = i64::try_from(ttl.as_secs())
            .map_err(|_| AttributionError::cookie_write(format!("ttl {:?} out of range", ttl)))?;
        let max_age = CookieDuration::seconds(seconds);
        let expires = OffsetDateTime::now_utc()
            .checked_add(max_age)
            .ok_or_else(|| AttributionError::cookie_write(format!("ttl {:?} out of range", ttl)))?;

        let mut cookie = self.build_cookie_base(name, value);
        cookie.set_http_only(false);
        cookie.set_max_age(max_age);
        cookie.set_expires(expires);
        Ok(cookie)
    }

    /// 会话 Cookie：HttpOnly，浏览器关闭即失效
    pub fn build_session_cookie(&self, name: &str, session_id: &str) -> Cookie<'static> {
        let mut cookie = self.build_cookie_base(name, session_id);
        cookie.set_http_only(true);
        cookie
    }
}

pub struct RequestCookieJar {
    incoming: HashMap<String, String>,
    written: HashMap<String, String>,
    pending: Vec<Cookie<'static>>,
    builder: CookieBuilder,
    session_cookie_name: String,
}

impl RequestCookieJar {
    pub fn from_request(req: &HttpRequest, config: &AttributionConfig) -> Self {
        Self::from_headers(req.headers(), config)
    }

    pub fn from_headers(headers: &HeaderMap, config: &AttributionConfig) -> Self {
        let mut incoming = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else {
                continue;
            };
            for (name, value) in parse_cookie_header(raw) {
                incoming.entry(name).or_insert(value);
            }
        }

        Self {
            incoming,
            written: HashMap::new(),
            pending: Vec::new(),
            builder: CookieBuilder::from_config(config),
            session_cookie_name: config.session_cookie_name.clone(),
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.get(&self.session_cookie_name)
            .filter(|session| !session.trim().is_empty())
    }

    /// 返回现有会话 ID，没有则生成一个并暂存会话 Cookie
    pub fn ensure_session(&mut self) -> String {
        if let Some(session) = self.session_id() {
            return session;
        }

        let session = new_session_id();
        let cookie = self
            .builder
            .build_session_cookie(&self.session_cookie_name, &session);
        self.stage(self.session_cookie_name.clone(), session.clone(), cookie);
        session
    }

    pub fn pending(&self) -> &[Cookie<'static>] {
        &self.pending
    }

    /// 把暂存的 Cookie 追加为 `Set-Cookie`，无法编码的 Cookie 记录日志后跳过
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for cookie in &self.pending {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => headers.append(header::SET_COOKIE, value),
                Err(e) => warn!("Dropping cookie {}: {}", cookie.name(), e),
            }
        }
    }

    fn stage(&mut self, name: String, value: String, cookie: Cookie<'static>) {
        self.pending.retain(|existing| existing.name() != name);
        self.pending.push(cookie);
        self.written.insert(name, value);
    }
}

impl CookieStore for RequestCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.written
            .get(name)
            .or_else(|| self.incoming.get(name))
            .cloned()
    }

    fn set(&mut self, name: &str, value: &str, ttl: Duration) -> Result<()> {
        let cookie = self.builder.build_attribution_cookie(name, value, ttl)?;
        self.stage(name.to_string(), value.to_string(), cookie);
        Ok(())
    }
}

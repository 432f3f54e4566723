//! 推广标识捕获端点
//!
//! 接收前端或中间件发来的 `{ "key": "..." }`，把标识记录到访客的归因会话上。
//! 请求体没有标识时依次退回归因 Cookie 和 query 参数。

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::cookies::RequestCookieJar;
use crate::attribution::{
    AffiliateKey, AttributionResolver, AttributionSessions, CookieStore, PageUrl,
};

#[derive(Debug, Default, Deserialize)]
pub struct CaptureParams {
    #[serde(default, alias = "aff_key")]
    pub key: Option<String>,
}

/// 请求体，同时接受扁平形式和 JSON-RPC 形式（`{"params": {"key": ...}}`）
#[derive(Debug, Default, Deserialize)]
pub struct CaptureRequest {
    #[serde(default, alias = "aff_key")]
    pub key: Option<String>,
    #[serde(default)]
    pub params: Option<CaptureParams>,
}

impl CaptureRequest {
    pub fn raw_key(&self) -> Option<&str> {
        self.key
            .as_deref()
            .or_else(|| self.params.as_ref().and_then(|p| p.key.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl CaptureResponse {
    fn accepted() -> Self {
        Self {
            ok: true,
            reason: None,
            key: None,
            captured_at: None,
        }
    }

    fn rejected(reason: &str) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
            key: None,
            captured_at: None,
        }
    }
}

pub struct CaptureService;

impl CaptureService {
    pub async fn capture(
        req: HttpRequest,
        body: Option<web::Json<CaptureRequest>>,
        resolver: web::Data<Arc<AttributionResolver>>,
        sessions: web::Data<Arc<AttributionSessions>>,
    ) -> HttpResponse {
        let config = resolver.config();
        let mut jar = RequestCookieJar::from_request(&req, config);

        let from_body = body
            .as_ref()
            .and_then(|b| b.raw_key())
            .and_then(|raw| AffiliateKey::normalize(raw, config.max_key_length));
        let key = from_body
            .or_else(|| {
                jar.get(&config.cookie_name)
                    .and_then(|raw| AffiliateKey::normalize(&raw, config.max_key_length))
            })
            .or_else(|| {
                let page = PageUrl::from_parts(req.path(), req.query_string());
                config.param_aliases.iter().find_map(|alias| {
                    page.query_param(alias)
                        .and_then(|raw| AffiliateKey::normalize(&raw, config.max_key_length))
                })
            });

        let Some(key) = key else {
            debug!("Capture request without a usable affiliate key");
            return HttpResponse::Ok().json(CaptureResponse::rejected("no_key"));
        };

        let session = jar.ensure_session();
        sessions.record(&session, key.clone());
        info!("Captured affiliate key {} for session {}", key, session);

        let mut response = HttpResponse::Ok().json(CaptureResponse::accepted());
        jar.apply_to(response.headers_mut());
        response
    }

    /// 查询当前会话记录的推广标识
    pub async fn current_session(
        req: HttpRequest,
        resolver: web::Data<Arc<AttributionResolver>>,
        sessions: web::Data<Arc<AttributionSessions>>,
    ) -> HttpResponse {
        let jar = RequestCookieJar::from_request(&req, resolver.config());

        let Some(session) = jar.session_id() else {
            return HttpResponse::Ok().json(CaptureResponse::rejected("no_session"));
        };

        match sessions.get(&session) {
            Some(entry) => HttpResponse::Ok().json(CaptureResponse {
                ok: true,
                reason: None,
                key: Some(entry.key.into_inner()),
                captured_at: Some(entry.captured_at),
            }),
            None => HttpResponse::Ok().json(CaptureResponse::rejected("no_key")),
        }
    }
}

/// 捕获端点路由
pub fn capture_routes(capture_path: &str) -> actix_web::Scope {
    web::scope(capture_path)
        .route("", web::post().to(CaptureService::capture))
        .route("/session", web::get().to(CaptureService::current_session))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_flat_and_rpc_bodies() {
        let flat: CaptureRequest = serde_json::from_str(r#"{"key":"A"}"#).unwrap();
        assert_eq!(flat.raw_key(), Some("A"));

        let aliased: CaptureRequest = serde_json::from_str(r#"{"aff_key":"B"}"#).unwrap();
        assert_eq!(aliased.raw_key(), Some("B"));

        let rpc: CaptureRequest = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"call","params":{"key":"C"}}"#,
        )
        .unwrap();
        assert_eq!(rpc.raw_key(), Some("C"));

        let empty: CaptureRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.raw_key(), None);
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let body = serde_json::to_value(CaptureResponse::accepted()).unwrap();
        assert_eq!(body, serde_json::json!({ "ok": true }));

        let body = serde_json::to_value(CaptureResponse::rejected("no_key")).unwrap();
        assert_eq!(body, serde_json::json!({ "ok": false, "reason": "no_key" }));
    }
}

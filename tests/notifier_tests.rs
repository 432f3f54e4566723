//! HTTP notifier delivery tests
//!
//! 在本地启动一个 actix 服务作为归因端点，验证通知的请求体与会话 Cookie。

use std::sync::{Arc, Mutex};

use actix_web::http::header;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use chrono::Utc;
use serde_json::{Value, json};

use affiliate_attribution::attribution::{
    AffiliateKey, AttributionNotifier, AttributionResolver, AttributionSessions, HttpNotifier,
    MemoryCookieStore, Notification, PageUrl, build_notifier,
};
use affiliate_attribution::config::{AttributionConfig, NotifierKind};

type Received = Arc<Mutex<Vec<(Value, Option<String>)>>>;

async fn record(
    req: HttpRequest,
    body: web::Bytes,
    received: web::Data<Received>,
) -> HttpResponse {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let cookie = req
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    received.lock().unwrap().push((payload, cookie));
    HttpResponse::Ok().json(json!({ "ok": true }))
}

async fn reject() -> HttpResponse {
    HttpResponse::InternalServerError().finish()
}

/// 启动端点，返回基础地址与服务句柄
fn start_endpoint(received: Received) -> (String, actix_web::dev::ServerHandle) {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(received.clone()))
            .route("/affiliate/capture", web::post().to(record))
            .route("/broken", web::post().to(reject))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .expect("Failed to bind test endpoint");

    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);
    (format!("http://{}", addr), handle)
}

fn http_config(base: &str, path: &str) -> AttributionConfig {
    AttributionConfig {
        notifier: NotifierKind::Http,
        endpoint_url: format!("{}{}", base, path),
        notify_timeout_ms: 5000,
        ..AttributionConfig::default()
    }
}

#[actix_rt::test]
async fn test_shop_page_posts_key_to_endpoint() {
    let received: Received = Arc::default();
    let (base, server) = start_endpoint(received.clone());

    let config = http_config(&base, "/affiliate/capture");
    let sessions = Arc::new(AttributionSessions::from_config(&config));
    let notifier = build_notifier(&config, sessions).unwrap();
    let resolver = AttributionResolver::new(config, notifier);

    let mut store = MemoryCookieStore::new().with_cookie(
        "aff_session",
        "sess-42",
        Utc::now() + chrono::Duration::hours(1),
    );
    let page = PageUrl::parse("https://site/shop?aff_key=ABC123").unwrap();

    let (_, handle) = resolver.resolve_and_dispatch(&page, &mut store);
    handle.expect("shop page dispatches").await.unwrap();

    {
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, json!({ "key": "ABC123" }));
        assert_eq!(received[0].1.as_deref(), Some("aff_session=sess-42"));
    }

    server.stop(false).await;
}

#[actix_rt::test]
async fn test_non_shop_page_makes_no_outbound_call() {
    let received: Received = Arc::default();
    let (base, server) = start_endpoint(received.clone());

    let config = http_config(&base, "/affiliate/capture");
    let sessions = Arc::new(AttributionSessions::from_config(&config));
    let notifier = build_notifier(&config, sessions).unwrap();
    let resolver = AttributionResolver::new(config, notifier);

    let mut store = MemoryCookieStore::new();
    let page = PageUrl::parse("https://site/about?aff_key=ABC123").unwrap();
    let (_, handle) = resolver.resolve_and_dispatch(&page, &mut store);

    assert!(handle.is_none());
    assert!(received.lock().unwrap().is_empty());

    server.stop(false).await;
}

#[actix_rt::test]
async fn test_error_status_is_reported_as_failure() {
    let received: Received = Arc::default();
    let (base, server) = start_endpoint(received);

    let notifier = HttpNotifier::from_config(&http_config(&base, "/broken")).unwrap();
    let notification = Notification {
        key: AffiliateKey::parse("ABC123").unwrap(),
        session: None,
    };

    assert!(notifier.notify(&notification).await.is_err());

    server.stop(false).await;
}

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

// 应用启动时间结构体
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: DateTime<Utc>,
}

impl AppStartTime {
    pub fn now() -> Self {
        Self {
            start_datetime: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub uptime_secs: i64,
    pub version: String,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(app_start_time: web::Data<AppStartTime>) -> impl Responder {
        trace!("Received health check request");

        let uptime = Utc::now() - app_start_time.start_datetime;
        HttpResponse::Ok().json(HealthResponse {
            status: "healthy".to_string(),
            started_at: app_start_time.start_datetime,
            uptime_secs: uptime.num_seconds().max(0),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health")
        .route("", web::get().to(HealthService::health_check))
        .route("", web::head().to(HealthService::health_check))
}

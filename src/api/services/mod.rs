pub mod capture;
pub mod fallback;
pub mod health;

pub use capture::{CaptureRequest, CaptureResponse, CaptureService, capture_routes};
pub use health::{AppStartTime, HealthResponse, HealthService, health_routes};

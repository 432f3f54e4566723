//! HTTP 层
//!
//! - `middleware`: 每个页面请求运行一次归因解析
//! - `services`: 捕获端点、健康检查
//! - `cookies`: 请求级 Cookie 罐

pub mod cookies;
pub mod middleware;
pub mod services;

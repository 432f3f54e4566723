//! Affiliate attribution - capture affiliate keys from landing URLs and carry
//! them into the shop flow
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface (default)
//!
//! # Architecture
//! - `attribution`: key resolution, cookie persistence and notifications
//! - `api`: HTTP middleware, capture endpoint and health check
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod attribution;
#[cfg(feature = "server")]
pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
#[cfg(feature = "server")]
pub mod runtime;
pub mod system;

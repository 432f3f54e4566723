//! Mode routing
//!
//! - Server mode: HTTP server running the attribution middleware
//! - CLI mode: one-shot resolution and config tooling

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "server")]
pub use server::run_server;

#[cfg(feature = "cli")]
pub use cli::run_cli;

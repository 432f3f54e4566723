//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// Affiliate attribution service
#[derive(Parser)]
#[command(name = "affiliate-attribution")]
#[command(version)]
#[command(about = "Resolves affiliate keys from URLs and cookies and notifies the attribution endpoint", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Run the resolver once against a URL and a set of cookies
    ///
    /// Usage: resolve --url https://site/shop?aff_key=ABC --cookie x_affiliate_key=XYZ
    Resolve {
        /// Page URL (absolute or starting with '/')
        #[arg(long)]
        url: String,

        /// Existing cookie as NAME=VALUE, may be repeated
        #[arg(long = "cookie", value_name = "NAME=VALUE")]
        cookies: Vec<String>,

        /// Deliver the notification with the configured notifier instead of logging it
        #[arg(long)]
        notify: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: stdout)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

//! CLI mode
//!
//! `resolve` runs the resolver once against an in-memory cookie store and
//! reports what a browser would see; `config generate` writes a sample config.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::attribution::{
    AttributionNotifier, AttributionResolver, AttributionSessions, KeySource, LogNotifier,
    MemoryCookieStore, PageUrl, Resolution, build_notifier,
};
use crate::cli::{Commands, ConfigCommands};
use crate::config::{AttributionConfig, StaticConfig};
use crate::errors::AttributionError;

/// 单次解析的输出
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    pub path: String,
    pub key: Option<String>,
    pub source: Option<String>,
    pub cookie_written: bool,
    pub cookie_expires_at: Option<chrono::DateTime<Utc>>,
    pub notified: bool,
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli(command: Commands, config: &StaticConfig) -> Result<()> {
    match command {
        Commands::Serve => bail!("serve is handled by server mode"),
        Commands::Resolve {
            url,
            cookies,
            notify,
            json,
        } => {
            let report = resolve_once(&config.attribution, &url, &cookies, notify).await?;
            print_report(&report, json)?;
            Ok(())
        }
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => generate_config(output_path.as_deref(), force),
    }
}

/// 解析 `NAME=VALUE` 形式的 Cookie 参数，预置为未过期的 Cookie
pub fn parse_cookie_args(
    cookies: &[String],
    config: &AttributionConfig,
) -> crate::errors::Result<MemoryCookieStore> {
    let expires_at = Utc::now()
        + chrono::Duration::from_std(config.retention())
            .map_err(|e| AttributionError::validation(e.to_string()))?;

    let mut store = MemoryCookieStore::new();
    for raw in cookies {
        let Some((name, value)) = raw.split_once('=') else {
            return Err(AttributionError::validation(format!(
                "cookie '{}' must be NAME=VALUE",
                raw
            )));
        };
        if name.trim().is_empty() {
            return Err(AttributionError::validation(format!(
                "cookie '{}' has an empty name",
                raw
            )));
        }
        store = store.with_cookie(name.trim(), value, expires_at);
    }
    Ok(store)
}

/// 运行一次解析；`deliver` 为 false 时通知只写日志
pub async fn resolve_once(
    config: &AttributionConfig,
    url: &str,
    cookies: &[String],
    deliver: bool,
) -> Result<ResolveReport> {
    let page = PageUrl::parse(url).with_context(|| format!("Invalid URL '{}'", url))?;
    let mut store = parse_cookie_args(cookies, config)?;

    let notifier: Arc<dyn AttributionNotifier> = if deliver {
        let sessions = Arc::new(AttributionSessions::from_config(config));
        build_notifier(config, sessions)?
    } else {
        Arc::new(LogNotifier)
    };
    let resolver = AttributionResolver::new(config.clone(), notifier);

    let (resolution, handle) = resolver.resolve_and_dispatch(&page, &mut store);

    // 进程即将退出，等待后台通知完成
    if let Some(handle) = handle
        && let Err(e) = handle.await
    {
        warn!("Notification task failed: {}", e);
    }

    let report = match resolution {
        Resolution::NoOp => ResolveReport {
            path: page.path().to_string(),
            key: None,
            source: None,
            cookie_written: false,
            cookie_expires_at: None,
            notified: false,
        },
        Resolution::Persisted {
            key,
            source,
            cookie_written,
            notified,
        } => ResolveReport {
            path: page.path().to_string(),
            key: Some(key.into_inner()),
            source: Some(match source {
                KeySource::Query(alias) => format!("query:{}", alias),
                KeySource::Cookie => "cookie".to_string(),
            }),
            cookie_written,
            cookie_expires_at: cookie_written
                .then(|| store.expires_at(&config.cookie_name))
                .flatten(),
            notified,
        },
    };
    Ok(report)
}

fn print_report(report: &ResolveReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    use colored::Colorize;
    match report.key {
        None => println!("{} no affiliate key on {}", "○".dimmed(), report.path),
        Some(ref key) => {
            println!(
                "{} {} (from {})",
                "✓".green().bold(),
                key.cyan(),
                report.source.as_deref().unwrap_or("-")
            );
            match report.cookie_expires_at {
                Some(expires) => println!("  cookie refreshed, expires {}", expires.to_rfc3339()),
                None => println!("  cookie untouched"),
            }
            if report.notified {
                println!("  notification sent for {}", report.path);
            } else {
                println!("  no notification ({} is outside the shop flow)", report.path);
            }
        }
    }
    Ok(())
}

fn generate_config(output_path: Option<&str>, force: bool) -> Result<()> {
    let Some(path) = output_path else {
        print!("{}", StaticConfig::generate_sample_config());
        return Ok(());
    };

    if Path::new(path).exists() && !force {
        bail!("{} already exists, use --force to overwrite", path);
    }

    StaticConfig::default().save_to_file(path)?;
    println!("Configuration written to {}", path);
    Ok(())
}

use clap::Parser;
use tracing::debug;

use affiliate_attribution::cli::{Cli, Commands};
use affiliate_attribution::config::{DEFAULT_CONFIG_PATH, get_config, init_config_from};
use affiliate_attribution::errors::AttributionError;
use affiliate_attribution::runtime::modes;
use affiliate_attribution::system::logging::init_logging;

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_config_from(cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH));
    let config = get_config();

    let command = cli.command.unwrap_or(Commands::Serve);

    // config generate 只输出文件，不需要日志
    let _log_guard = match command {
        Commands::Config { .. } => None,
        _ => match init_logging(&config.logging) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Failed to initialize logging: {}", e);
                std::process::exit(1);
            }
        },
    };
    debug!("Configuration loaded: {:?}", config);

    let result = match command {
        Commands::Serve => modes::run_server(config.clone()).await,
        other => modes::run_cli(other, &config).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<AttributionError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
}

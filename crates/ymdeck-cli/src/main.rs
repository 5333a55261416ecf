mod commands;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ymdeck_host::{normalize_args, LaunchInfo};
use ymdeck_types::{BridgeConfig, ConfigLoader};

/// The host launches the plugin as
/// `ymdeck -port <p> -pluginUUID <uuid> -registerEvent <event> -info <json>`.
#[derive(Parser, Debug)]
#[command(name = "ymdeck", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Port of the host's WebSocket
    #[arg(long)]
    port: Option<u16>,

    /// Identifier the host assigned to this plugin instance
    #[arg(long = "pluginUUID")]
    plugin_uuid: Option<String>,

    /// Event name to register with
    #[arg(long = "registerEvent")]
    register_event: Option<String>,

    /// JSON description of the host application
    #[arg(long)]
    info: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that Yandex Music is reachable over its debugging port
    Check {
        /// Debugging port to probe instead of the configured one
        #[arg(long)]
        debug_port: Option<u16>,

        /// Also toggle playback once connected
        #[arg(long)]
        toggle: bool,
    },
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args()));
    let loaded = ConfigLoader::new().load();

    match cli.command {
        Some(Commands::Check { debug_port, toggle }) => {
            logging::init_stderr();
            let effective = loaded?;
            runtime()?.block_on(commands::check::run(&effective, debug_port, toggle))
        }
        None => {
            let port = cli
                .port
                .context("missing -port; the plugin is started by the deck software")?;
            let launch = LaunchInfo::new(
                port,
                cli.plugin_uuid.unwrap_or_default(),
                cli.register_event.unwrap_or_default(),
                cli.info.as_deref(),
            )?;

            let config = match &loaded {
                Ok(effective) => effective.config.clone(),
                Err(_) => BridgeConfig::default(),
            };
            logging::init_file(&config.log_dir())?;
            logging::install_panic_hook();
            match &loaded {
                Ok(effective) => logging::log_config_sources(effective),
                Err(e) => tracing::warn!(error = %e, "invalid configuration, using defaults"),
            }

            runtime()?.block_on(commands::plugin::run(config, launch))
        }
    }
}

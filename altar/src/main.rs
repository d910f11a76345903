//! Altar - Awtrix scheduling broker
//!
//! CLI entry point for running and stopping the broker.

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use altar::admin::AdminClient;
use altar::awtrix::AppData;
use altar::broker::Broker;
use altar::cli::{Cli, Command};
use altar::config::{Config, StaticAppConfig};
use altar::device::HttpTransport;
use altar::routine::{Application, Routine};

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("altar")
        .join("logs")
        .join("altar.log")
}

fn parse_level(level: &str) -> tracing::Level {
    match level.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", level);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, log_path: &Path) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > DEBUG in debug mode > INFO
    let level = cli_log_level
        .or(config_log_level)
        .map(parse_level)
        .unwrap_or(tracing::Level::INFO);

    let log_file = fs::File::create(log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?}, file: {})", level, log_path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load logging settings from config early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref(), cli.debug_mode());
    let log_path = cli
        .log_file
        .clone()
        .or_else(|| Config::load_log_file(cli.config.as_ref()))
        .unwrap_or_else(default_log_path);

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref(), &log_path)
        .context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let command = cli.command.unwrap_or_default();
    debug!(?command, "main: dispatching command");
    match command {
        Command::Run {
            address,
            admin_port,
            device_port,
            debug,
        } => {
            let debug_flag = debug;
            debug!(?address, ?admin_port, ?device_port, debug = debug_flag, "main: matched Run command");
            cmd_run(config, address, admin_port, device_port, debug).await
        }
        Command::Stop { host, admin_port } => {
            debug!(%host, ?admin_port, "main: matched Stop command");
            cmd_stop(&host, admin_port.unwrap_or(config.admin.port)).await
        }
    }
}

/// Run the broker until ctrl-c or the shutdown command
async fn cmd_run(
    config: Config,
    address: Option<String>,
    admin_port: Option<u16>,
    device_port: Option<u16>,
    debug_mode: bool,
) -> Result<()> {
    debug!("cmd_run: called");
    let address = address.unwrap_or_else(|| config.device.address.clone());
    let admin_port = admin_port.unwrap_or(config.admin.port);
    let device_port = device_port.or(config.device.port);
    let debug_mode = debug_mode || config.debug;
    let admin_host: IpAddr = config
        .admin
        .host
        .parse()
        .with_context(|| format!("Invalid admin host '{}'", config.admin.host))?;

    let routines = build_routines(&config.apps);
    let client = reqwest::Client::builder()
        .timeout(config.device.timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let broker = Broker::new(&address, routines, config.display.options())?
        .with_debug_mode(debug_mode)
        .with_admin_host(admin_host)
        .with_admin_port(admin_port)
        .with_device_port(device_port)
        .with_http_client(client.clone())
        .with_transport(Arc::new(HttpTransport::from_client(client)));

    info!(%address, admin = %broker.admin_addr(), debug_mode, "Starting broker");
    println!("Altar broker running, admin server on {}", broker.admin_addr());
    broker.start().await
}

/// Ask a running broker to exit
async fn cmd_stop(host: &str, admin_port: u16) -> Result<()> {
    debug!(%host, admin_port, "cmd_stop: called");
    let client = AdminClient::new(host, admin_port)?;
    client.shutdown().await?;
    println!("Altar broker stopped");
    Ok(())
}

/// Static text apps from config, or a hello-world app when none are configured
fn build_routines(apps: &[StaticAppConfig]) -> Vec<Box<dyn Routine>> {
    if apps.is_empty() {
        info!("No apps configured, registering hello-world");
        return vec![static_app(&StaticAppConfig {
            name: "hello-world".to_string(),
            text: "Hello, World!".to_string(),
            ..Default::default()
        })];
    }
    apps.iter().map(static_app).collect()
}

fn static_app(app: &StaticAppConfig) -> Box<dyn Routine> {
    let data = AppData {
        text: Some(app.text.as_str().into()),
        icon: app.icon.clone(),
        ..Default::default()
    };
    Application::from_fn(app.name.clone(), move |state, _| {
        state.data = data.clone();
        Ok(())
    })
    .with_poll_rate(app.poll_rate())
    .boxed()
}

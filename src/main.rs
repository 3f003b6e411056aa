//! Search gateway entry point.

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use search_gateway::backend::OpenSearchClient;
use search_gateway::config::{Config, LogFormat};
use search_gateway::metrics;
use search_gateway::shutdown::shutdown_signal;
use search_gateway::Application;

/// HTTP gateway in front of an OpenSearch index.
#[derive(Parser, Debug)]
#[command(name = "search-gateway")]
#[command(about = "Health, status and search endpoints over an OpenSearch backend")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Probe the backend once and report whether it is reachable.
    Probe,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Logging settings come from config when it loads; fall back so that a
    // config failure can still be reported.
    let loaded = Config::load();
    let (level, format) = match &loaded {
        Ok(config) => (config.rust_log.clone(), config.log_format),
        Err(_) => ("info".to_string(), LogFormat::Text),
    };
    init_logging(args.verbose, &level, format);

    let config = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Probe) => cmd_probe(&config).await,
        None => cmd_serve(config, args.port).await,
    }
}

fn init_logging(verbose: bool, level: &str, format: LogFormat) {
    let filter = if verbose {
        EnvFilter::new("search_gateway=debug,info")
    } else {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}

/// Run the server until SIGINT/SIGTERM.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.port = port;
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    metrics::init_metrics();
    if config.metrics_enabled {
        metrics::install_exporter(config.metrics_port)?;
    }

    info!(port = config.port, backend = %config.opensearch_url, "Starting server");

    let app = Application::build(&config).await?;
    app.run_until_stopped(shutdown_signal()).await?;

    Ok(())
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("SEARCH GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Backend: {}", config.opensearch_url);
    println!("  Index / Field: {} / {}", config.search_index, config.search_field);
    println!("  Port: {}", config.port);
    println!("  Request Timeout: {}s", config.request_timeout_secs);
    println!("  Shutdown Timeout: {}s", config.shutdown_timeout_secs);
    println!("  Backend Timeout: {}s", config.backend_timeout_secs);
    println!(
        "  Readiness: {} attempts, {}ms step",
        config.readiness_max_attempts, config.readiness_base_delay_ms
    );
    println!(
        "  Metrics: {}",
        if config.metrics_enabled {
            format!("Enabled on :{}", config.metrics_port)
        } else {
            "Disabled".to_string()
        }
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Probe the backend once.
async fn cmd_probe(config: &Config) -> anyhow::Result<()> {
    let client = OpenSearchClient::new(config)?;

    print!("Probing {}... ", client.endpoint());
    if client.probe().await {
        println!("OK");
        Ok(())
    } else {
        println!("FAILED");
        Err(anyhow::anyhow!("OpenSearch at {} is unreachable", client.endpoint()))
    }
}

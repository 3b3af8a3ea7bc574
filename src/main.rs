//! Items API entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use laundry_items::api::{create_router, AppState};
use laundry_items::config::{Config, CorsOrigins};
use laundry_items::metrics;
use laundry_items::utils::shutdown_signal;
use laundry_items::{store, Result};

/// REST API for laundry and shoe-care orders.
#[derive(Parser, Debug)]
#[command(name = "laundry-items")]
#[command(about = "CRUD API over the Supabase items table")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,

    /// Keep items in memory instead of Supabase.
    #[arg(long)]
    memory: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Keep items in memory instead of Supabase.
        #[arg(long)]
        memory: bool,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    init_logging(&config, args.verbose);

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config)?,
        Some(Command::Serve { port, memory }) => cmd_serve(config, port, memory).await?,
        None => cmd_serve(config, args.port, args.memory).await?,
    }

    Ok(())
}

fn init_logging(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("laundry_items=debug,info")
    } else {
        EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let json = config.log_json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("ITEMS API - CONFIGURATION CHECK");
    println!("======================================================================");

    println!("  Supabase URL: {}", config.supabase_url().unwrap_or("(not set)"));
    println!(
        "  Supabase Key: {}",
        if config.supabase_key().is_some() {
            "present"
        } else {
            "(not set)"
        }
    );
    println!("  Table: {}", config.supabase_table);
    println!("  Port: {}", config.port);
    println!(
        "  CORS: {}",
        match config.cors_origins() {
            CorsOrigins::Any => "any origin".to_string(),
            CorsOrigins::List(list) => format!("{} origin(s)", list.len()),
        }
    );
    println!(
        "  Metrics: {}",
        if config.metrics_enabled {
            format!("enabled on port {}", config.metrics_port)
        } else {
            "disabled".to_string()
        }
    );

    let warnings = config.validate();
    println!("----------------------------------------------------------------------");
    if warnings.is_empty() {
        println!("CONFIGURATION CHECK PASSED");
    } else {
        for warning in &warnings {
            println!("  WARNING: {}", warning);
        }
        println!("CONFIGURATION CHECK PASSED WITH {} WARNING(S)", warnings.len());
    }
    println!("======================================================================");

    Ok(())
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(config: Config, port_override: Option<u16>, memory: bool) -> Result<()> {
    metrics::init_metrics();
    if config.metrics_enabled {
        metrics::install_exporter(config.metrics_port)?;
    }

    let store = store::open(&config, memory)?;

    let app_state = AppState::new(store);
    let router = create_router(app_state, &config.cors_origins());

    let port = port_override.unwrap_or(config.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("API running on http://localhost:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

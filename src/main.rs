use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use waypoint::config::load_config;
use waypoint::lifecycle::{signals, startup, Application, Shutdown};
use waypoint::observability::{logging, Palette};

/// Location search service with file-based routing.
#[derive(Debug, Parser)]
#[command(name = "waypoint", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration.
    #[arg(short, long)]
    port: Option<u16>,

    /// Routes directory, overriding the configuration.
    #[arg(long)]
    routes: Option<PathBuf>,

    /// Print the discovered routes and exit.
    #[arg(long)]
    list_routes: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(routes) = cli.routes {
        config.routes.directory = routes;
    }

    logging::init(&config.logging);
    tracing::info!("waypoint v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        address = %config.server.socket_address(),
        database = %config.database.path,
        routes = %config.routes.directory.display(),
        "Configuration loaded"
    );

    let palette = Palette::from_config(&config.logging);
    let services = startup::connect_services(&config.database, &palette).await?;
    let app = Application::create(&config, &services, &palette).await?;

    if cli.list_routes {
        for route in app.routes().routes() {
            println!("{:<7} {:<24} {}", route.method.as_str(), route.pattern, route.endpoint.source());
        }
        return Ok(());
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());
    app.start(&shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

mod config;
mod coordinator;
mod discovery;
mod rules;
mod status;
mod transport;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::info;

use mech_app::{init_logging, ConfigFile};
use mech_core::DynResult;
use mech_protocol::StatusSnapshot;

use config::{ServerConfig, EXAMPLE_CONFIG};
use coordinator::Coordinator;
use discovery::StaticDiscovery;
use rules::TableRuleEngine;
use status::spawn_status_frontend;
use transport::ReqwestTransport;

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - home automation coordinator");

#[derive(Debug, Parser)]
#[command(version = env!("CARGO_PKG_VERSION"), about = PKG_DESCRIPTION)]
struct Cli {
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// IP address for the status endpoint
    #[arg(short = 'l', long = "listen")]
    listen: Option<IpAddr>,
    /// Port for the status endpoint
    #[arg(short = 'p', long = "port")]
    port: Option<u16>,
    /// Path to the automation rule table
    #[arg(long = "rules", value_name = "FILE")]
    rules: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> DynResult<()> {
    let cli = Cli::parse();
    if cli.print_config {
        print!("{}", EXAMPLE_CONFIG);
        return Ok(());
    }

    let (mut config, config_path) = match &cli.config {
        Some(path) => (ServerConfig::load_from_file(path)?, Some(path.clone())),
        None => ServerConfig::load_from_default_paths()?,
    };
    init_logging(config.general.log_level.as_deref());
    if let Some(path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    if let Some(listen) = cli.listen {
        config.listen.address = listen;
    }
    if let Some(port) = cli.port {
        config.listen.port = port;
    }
    if cli.rules.is_some() {
        config.rules.file = cli.rules;
    }

    let engine = match &config.rules.file {
        Some(path) => TableRuleEngine::load(path)?,
        None => {
            info!("No rule table configured, automation is idle");
            TableRuleEngine::empty()
        }
    };

    let host = config
        .general
        .host
        .clone()
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string());

    let (status_tx, status_rx) = watch::channel(StatusSnapshot::default());
    let addr = SocketAddr::new(config.listen.address, config.listen.port);
    let frontend = spawn_status_frontend(addr, status_rx, config.listen.status_cap);

    let (completion_tx, completion_rx) = mpsc::unbounded_channel();
    let transport = ReqwestTransport::new(completion_tx)?;
    let discovery = Box::new(StaticDiscovery::from_config(&config.discovery));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        let _ = shutdown_tx.send(true);
    });

    info!(
        "Coordinating {} control, {} history, {} almanac providers",
        config.discovery.control.len(),
        config.discovery.history.len(),
        config.discovery.almanac.len()
    );

    let coordinator = Coordinator::new(host, engine, discovery, transport, status_tx);
    coordinator.run(completion_rx, shutdown_rx).await;

    frontend.abort();
    Ok(())
}

use std::sync::Arc;

use clap::Parser;
use env_logger::Builder;
use log::{debug, error, info, LevelFilter};
use tokio::sync::watch;

use sdxd::{speaker, transport};
use sdxd::{AnnouncementListener, Disseminator, ExchangeConfig, Topology};

#[derive(Parser, Debug)]
#[clap(name = "sdxd", rename_all = "kebab-case")]
/// SDX Route Server
struct Args {
    /// Path to exchange config.toml
    config_path: String,
    /// Show debug logs (additive for trace logs)
    #[clap(short, parse(from_occurrences))]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let (sdxd_level, other_level) = match args.verbose {
        0 => (LevelFilter::Info, LevelFilter::Warn),
        1 => (LevelFilter::Debug, LevelFilter::Warn),
        2 => (LevelFilter::Trace, LevelFilter::Warn),
        _ => (LevelFilter::Trace, LevelFilter::Trace),
    };
    Builder::new()
        .filter(Some("sdxd"), sdxd_level)
        .filter(None, other_level)
        .init();
    info!("Logging at levels {}/{}", sdxd_level, other_level);

    let config = match ExchangeConfig::from_file(&args.config_path) {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };
    let topology = match Topology::new(&config) {
        Ok(topology) => Arc::new(topology),
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };
    debug!(
        "Found {} participants in {}",
        topology.len(),
        args.config_path
    );

    let (route_tx, route_rx) = transport::route_channel();
    let (announcement_tx, announcement_rx) = transport::announcement_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = match AnnouncementListener::bind(config.listener_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(
                "Unable to bind announcement listener on {}: {}",
                config.listener_addr, err
            );
            std::process::exit(1);
        }
    };
    info!("Announcement listener on {}", config.listener_addr);
    tokio::spawn(listener.run(announcement_tx));

    // Speaker bridge: stdin feeds routes in, stdout carries announcements out
    tokio::spawn(speaker::read_updates(route_tx));
    tokio::spawn(speaker::write_announcements(announcement_rx));

    let disseminator = Disseminator::new(
        Arc::clone(&topology),
        route_rx,
        config.poll_interval,
        config.delivery_timeout,
        shutdown_rx,
    );
    let dissemination = tokio::spawn(disseminator.run());

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Stopping SDX route server..."),
        Err(err) => error!("Error waiting for stop signal: {}", err),
    }
    // The loop observes the flag at its next iteration boundary; the
    // listener may stay blocked in accept and is dropped with the process
    let _ = shutdown_tx.send(true);
    let _ = dissemination.await;
}

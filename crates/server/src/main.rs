// Copyright (C) 2025 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use crate::config::ServerConfig;
use crate::server::Server;
use beryl_db::{dispatch_one, now_secs};
use clap::Parser;
use clap_derive::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::select;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;
use tracing::info;

mod auth;
mod commands;
mod config;
mod connection;
mod listener;
mod monitor;
mod server;
mod settings;

#[derive(Parser, Debug)]
struct Args {
    #[arg(
        short,
        long,
        value_name = "config",
        help = "Path to configuration (yaml) file to use, if any. If not specified, defaults are used."
    )]
    config_file: Option<PathBuf>,

    #[arg(long, value_name = "listen-address", help = "Listen address override")]
    listen_address: Option<String>,

    #[arg(long, value_name = "listen-port", help = "Listen port override")]
    listen_port: Option<u16>,

    #[arg(long, value_name = "data-dir", help = "Data directory override")]
    data_dir: Option<PathBuf>,

    #[arg(long, value_name = "workers", help = "Flusher worker thread count override")]
    workers: Option<usize>,

    #[arg(long, help = "Enable debug logging", default_value = "false")]
    debug: bool,

    #[arg(
        long,
        help = "Accepted for compatibility; this server never forks",
        default_value = "false"
    )]
    nofork: bool,

    #[arg(
        long,
        help = "Wipe every entry in the default database, then exit",
        default_value = "false"
    )]
    flushdb: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), eyre::Error> {
    color_eyre::install()?;
    let args: Args = Args::parse();
    beryl_common::logging::setup(args.debug);

    let mut config = ServerConfig::load(args.config_file.as_deref())?;
    if let Some(address) = args.listen_address {
        config.listen_address = address;
    }
    if let Some(port) = args.listen_port {
        config.listen_port = port;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let server = Server::new(config)?;

    if args.flushdb {
        flush_default_database(&server)?;
        server.shutdown();
        return Ok(());
    }

    // Dispatcher: the single consumer of completed queries.
    let results = server.flusher.results();
    let dispatcher = tokio::spawn(async move {
        while let Ok(submitted) = results.recv_async().await {
            dispatch_one(submitted);
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Second-granularity sweep for expirations and futures.
    let timer_server = server.clone();
    let mut timer_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(250));
        let mut last_sweep = now_secs();
        loop {
            select! {
                _ = ticker.tick() => {
                    let now = now_secs();
                    if now > last_sweep {
                        last_sweep = now;
                        timer_server.run_timed(now);
                    }
                }
                _ = timer_shutdown.changed() => break,
            }
        }
    });

    // Startup is done; begin processing queries.
    server.flusher.resume();

    let listener = tokio::spawn(listener::run(server.clone(), shutdown_rx.clone()));

    let mut stop_signal =
        signal(SignalKind::interrupt()).expect("Unable to register STOP signal handler");
    let mut term_signal =
        signal(SignalKind::terminate()).expect("Unable to register TERM signal handler");
    select! {
        _ = stop_signal.recv() => {
            info!("STOP received, stopping...");
        }
        _ = term_signal.recv() => {
            info!("TERM received, stopping...");
        }
        result = listener => {
            if let Ok(Err(e)) = result {
                tracing::error!("Listener failed: {e}");
            }
        }
    }

    let _ = shutdown_tx.send(true);
    server.shutdown();
    dispatcher.abort();
    info!("Done.");
    Ok(())
}

/// The `--flushdb` maintenance path: delete every physical row of the
/// default database and leave.
fn flush_default_database(server: &Server) -> Result<(), eyre::Error> {
    let database = server
        .manager
        .default_db()
        .ok_or_else(|| eyre::eyre!("no default database"))?;
    let store = database.store();
    let mut victims = Vec::new();
    for row in store.iter() {
        let (key, _) = row?;
        victims.push(key);
    }
    let count = victims.len();
    for key in victims {
        store.delete(std::str::from_utf8(&key)?)?;
    }
    info!("Flushed {count} entries from '{}'.", database.name());
    Ok(())
}

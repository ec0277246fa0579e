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

use crate::connection;
use crate::server::Server;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::select;
use tokio::sync::watch;
use tracing::{info, warn};

/// Accept loop. One task per accepted connection; stops when the shutdown
/// flag flips.
pub async fn run(
    server: Arc<Server>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), eyre::Error> {
    let addr = format!(
        "{}:{}",
        server.config.listen_address, server.config.listen_port
    );
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    loop {
        let mut shutdown_rx = shutdown.clone();
        select! {
            _ = shutdown_rx.changed() => {
                info!("Listener stopping.");
                return Ok(());
            }
            result = listener.accept() => {
                match result {
                    Ok((stream, peer_addr)) => {
                        info!(?peer_addr, "Accepted connection");
                        tokio::spawn(connection::handle(
                            server.clone(),
                            stream,
                            peer_addr,
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        warn!(?e, "Accept failed, can't handle connection");
                    }
                }
            }
        }
    }
}

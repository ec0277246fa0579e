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

//! One connected client: a line-framed socket, the session state, and the
//! frame sink the dispatcher writes through. The read and write sides share
//! one task so a session's replies always flow in submission order.

use crate::commands::{self, Outcome, Session};
use crate::server::Server;
use beryl_common::{Frame, Numeric};
use beryl_db::User;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::select;
use tokio::sync::watch;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info};
use uuid::Uuid;

/// Longest accepted command line, in bytes.
const MAX_LINE: usize = 64 * 1024;

pub async fn handle(
    server: Arc<Server>,
    stream: TcpStream,
    peer_addr: SocketAddr,
    mut shutdown: watch::Receiver<bool>,
) {
    let uuid = Uuid::new_v4().simple().to_string();
    let instance = format!("c{}", &uuid[..11]);
    let (user, frames) = User::new(&instance);
    if let Some(database) = server.manager.default_db() {
        user.set_database(database);
    }
    server.clients.add(user.clone());

    let framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE));
    let (mut sink, mut lines) = framed.split();
    let greeting = Frame::new(
        Numeric::Connected,
        format!("BerylDB {}", env!("CARGO_PKG_VERSION")),
    );
    let _ = sink.send(greeting.to_string()).await;

    let mut session = Session::new(user.clone());
    loop {
        select! {
            frame = frames.recv_async() => {
                match frame {
                    Ok(frame) => {
                        if sink.send(frame.to_string()).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            line = lines.next() => {
                match line {
                    Some(Ok(line)) => {
                        if commands::handle_line(&server, &mut session, &line) == Outcome::Quit {
                            // Flush what the handler queued before closing.
                            while let Ok(frame) = frames.try_recv() {
                                let _ = sink.send(frame.to_string()).await;
                            }
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(?peer_addr, "Framing error: {e}");
                        break;
                    }
                    None => break,
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    user.set_quitting();
    let instance = user.instance();
    server.monitors.remove(&instance);
    server.clients.remove(&instance);
    info!(?peer_addr, instance, "Connection closed");
}

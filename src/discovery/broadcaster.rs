//! Periodic hello broadcaster

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::models::HelloMessage;
use crate::shutdown;

/// Announces this node's sync service on the discovery port
#[derive(Debug, Clone)]
pub struct Broadcaster {
    target: SocketAddr,
    hello: HelloMessage,
    interval: Duration,
}

impl Broadcaster {
    /// Broadcaster advertising `service_port`, which may differ from the
    /// configured one when the service was bound to an ephemeral port
    pub fn new(config: &NodeConfig, service_port: u16) -> Self {
        Self {
            target: SocketAddr::V4(SocketAddrV4::new(config.broadcast_ip, config.discovery_port)),
            hello: HelloMessage::new(service_port, config.host_label.clone()),
            interval: config.discovery_interval(),
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    pub fn hello(&self) -> &HelloMessage {
        &self.hello
    }

    /// Send a hello every interval until `stop` flips to true
    ///
    /// Failures to open the socket or to send are swallowed; the next tick
    /// tries again.
    pub async fn run(self, mut stop: watch::Receiver<bool>) -> Result<()> {
        let payload = self.hello.encode()?;
        let mut socket: Option<UdpSocket> = None;
        let mut interval = shutdown::ticker(self.interval);

        tracing::info!(destination = %self.target, port = ?self.hello.port, "Discovery broadcaster started");

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown::requested(&mut stop) => break,
            }

            if socket.is_none() {
                match broadcast_socket().await {
                    Ok(s) => socket = Some(s),
                    Err(e) => {
                        tracing::debug!(error = %e, "Broadcast socket unavailable");
                        continue;
                    }
                }
            }

            if let Some(s) = &socket {
                if let Err(e) = s.send_to(&payload, self.target).await {
                    tracing::trace!(error = %e, "Hello not sent");
                }
            }
        }

        tracing::debug!("Discovery broadcaster stopped");
        Ok(())
    }
}

async fn broadcast_socket() -> Result<UdpSocket> {
    let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0));
    let socket = UdpSocket::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    socket.set_broadcast(true)?;
    Ok(socket)
}

//! Hello receiver feeding the peer registry

use std::net::{IpAddr, SocketAddr};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::config::NodeConfig;
use crate::error::{Error, Result};
use crate::models::HelloMessage;
use crate::shutdown;
use crate::storage::PeerRegistry;

/// Largest datagram read; hellos are far smaller
const MAX_DATAGRAM: usize = 4096;

/// Host label recorded when a hello does not carry one
const UNKNOWN_HOST: &str = "peer";

/// What happened to one received datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelloOutcome {
    /// Not JSON, or not a hello
    Ignored,
    /// Sent from a loopback address, i.e. most likely by this host
    Loopback,
    /// Registry updated; `is_new` if the address was not known before
    Registered { address: String, is_new: bool },
}

/// Receives hellos on the discovery port and upserts the peer registry
#[derive(Debug, Clone)]
pub struct Listener {
    bind_addr: SocketAddr,
    default_port: u16,
    registry: PeerRegistry,
}

impl Listener {
    pub fn new(config: &NodeConfig, registry: PeerRegistry) -> Self {
        Self {
            bind_addr: SocketAddr::new(config.bind_ip, config.discovery_port),
            default_port: config.service_port,
            registry,
        }
    }

    /// Bind the discovery socket with address reuse enabled
    pub fn bind(&self) -> Result<UdpSocket> {
        bind_reusable(self.bind_addr)
    }

    /// Receive hellos until `stop` flips to true
    ///
    /// Bad datagrams and receive errors are skipped. A registry write failure
    /// ends the listener.
    pub async fn run(self, mut stop: watch::Receiver<bool>) -> Result<()> {
        let socket = self.bind()?;
        tracing::info!(addr = %self.bind_addr, "Discovery listener started");

        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let received = tokio::select! {
                r = socket.recv_from(&mut buf) => r,
                _ = shutdown::requested(&mut stop) => break,
            };

            let (len, from) = match received {
                Ok(r) => r,
                Err(e) => {
                    tracing::trace!(error = %e, "Discovery receive failed");
                    continue;
                }
            };

            self.handle_datagram(&buf[..len], from).await?;
        }

        tracing::debug!("Discovery listener stopped");
        Ok(())
    }

    /// Process one datagram received from `from`
    pub async fn handle_datagram(&self, bytes: &[u8], from: SocketAddr) -> Result<HelloOutcome> {
        let Some(hello) = HelloMessage::decode(bytes) else {
            tracing::trace!("Ignored non-hello datagram");
            return Ok(HelloOutcome::Ignored);
        };

        let ip = canonical_ip(from.ip());
        if ip.is_loopback() {
            return Ok(HelloOutcome::Loopback);
        }

        let address = ip.to_string();
        let port = hello.port.unwrap_or(self.default_port);
        let host = hello.host.as_deref().unwrap_or(UNKNOWN_HOST);

        let is_new = self.registry.upsert(&address, port, host).await?;
        if is_new {
            tracing::info!(peer = %address, port, host, "Discovered peer");
        }

        Ok(HelloOutcome::Registered { address, is_new })
    }
}

fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

fn bind_reusable(addr: SocketAddr) -> Result<UdpSocket> {
    let bind_err = |source| Error::Bind { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))
        .map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;

    UdpSocket::from_std(socket.into()).map_err(bind_err)
}

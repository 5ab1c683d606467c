use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::{lookup_host, UdpSocket};
use tracing::debug;

use metricfwd_core::error::Result;

use super::Sink;

/// Connected UDP socket; one datagram per payload.
pub struct UdpSink {
    socket: UdpSocket,
    peer: SocketAddr,
}

impl UdpSink {
    /// Resolve `addr` and connect an ephemeral local socket to it.
    pub async fn connect(addr: &str) -> Result<Self> {
        let peer = lookup_host(addr).await?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("no address for {addr}"))
        })?;
        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        debug!(%peer, "udp sink connected");
        Ok(Self { socket, peer })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

#[async_trait]
impl Sink for UdpSink {
    fn name(&self) -> &'static str {
        "udp"
    }

    async fn write(&mut self, payload: Bytes) -> Result<()> {
        let sent = self.socket.send(&payload).await?;
        if sent != payload.len() {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "short datagram write").into());
        }
        Ok(())
    }
}

//! Seam between the iterative walk and the wire.
//!
//! The resolver only ever needs "send these bytes to that nameserver and
//! give me the reply", so that round-trip sits behind a trait and the walk
//! can be driven against a scripted peer in tests.

use crate::dns::transport::{DnsTransport, TcpTransport, UdpTransport};
use async_trait::async_trait;
use oxidns_domain::DnsError;
use std::net::SocketAddr;
use std::time::Duration;

#[async_trait]
pub trait NameserverExchange: Send + Sync {
    /// One datagram round-trip with the given nameserver.
    async fn exchange_datagram(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DnsError>;

    /// One length-prefixed stream round-trip with the given nameserver.
    async fn exchange_stream(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DnsError>;
}

/// Production exchange backed by the real transports.
#[derive(Default)]
pub struct SocketExchange;

impl SocketExchange {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NameserverExchange for SocketExchange {
    async fn exchange_datagram(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DnsError> {
        UdpTransport::new(server)
            .send(query, timeout)
            .await
            .map(|response| response.bytes)
    }

    async fn exchange_stream(
        &self,
        server: SocketAddr,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DnsError> {
        TcpTransport::new(server)
            .send(query, timeout)
            .await
            .map(|response| response.bytes)
    }
}

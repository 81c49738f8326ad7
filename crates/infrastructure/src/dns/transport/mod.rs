pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use oxidns_domain::DnsError;
use std::time::Duration;

pub use tcp::{read_with_length_prefix, send_with_length_prefix, TcpTransport};
pub use udp::UdpTransport;

/// Largest datagram either direction of the UDP path will carry.
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// Deadline for stream transports and forwarder datagrams.
pub const STREAM_TIMEOUT: Duration = Duration::from_secs(5);
/// Deadline for authoritative nameserver datagrams.
pub const NAMESERVER_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
    pub protocol_used: &'static str,
}

/// One outbound round-trip over a concrete transport.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError>;

    fn protocol_name(&self) -> &'static str;
}

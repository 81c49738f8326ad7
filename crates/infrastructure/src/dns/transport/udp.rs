//! UDP transport for DNS queries (RFC 1035 §4.2.1).
//!
//! Messages are sent as-is with no framing and responses are limited to
//! 512 bytes. If the response carries the TC bit, the caller retries over
//! the stream transport.

use super::{DnsTransport, TransportResponse, MAX_DATAGRAM_SIZE};
use async_trait::async_trait;
use oxidns_domain::DnsError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| DnsError::Io(format!("failed to bind UDP socket: {}", e)))?;

        tokio::time::timeout(timeout, socket.send_to(message_bytes, self.server_addr))
            .await
            .map_err(|_| DnsError::Timeout {
                server: self.server_addr.to_string(),
            })?
            .map_err(|e| {
                DnsError::Io(format!(
                    "failed to send UDP query to {}: {}",
                    self.server_addr, e
                ))
            })?;

        debug!(
            server = %self.server_addr,
            bytes_sent = message_bytes.len(),
            "UDP query sent"
        );

        let mut recv_buf = vec![0u8; MAX_DATAGRAM_SIZE];

        let (bytes_received, from_addr) =
            tokio::time::timeout(timeout, socket.recv_from(&mut recv_buf))
                .await
                .map_err(|_| DnsError::Timeout {
                    server: self.server_addr.to_string(),
                })?
                .map_err(|e| {
                    DnsError::Io(format!(
                        "failed to receive UDP response from {}: {}",
                        self.server_addr, e
                    ))
                })?;

        if from_addr.ip() != self.server_addr.ip() {
            warn!(
                expected = %self.server_addr,
                received_from = %from_addr,
                "UDP response from unexpected source"
            );
        }

        recv_buf.truncate(bytes_received);

        debug!(
            server = %self.server_addr,
            bytes_received = bytes_received,
            "UDP response received"
        );

        Ok(TransportResponse {
            bytes: recv_buf,
            protocol_used: "UDP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}

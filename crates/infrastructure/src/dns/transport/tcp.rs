//! TCP transport: every message is framed as a 2-byte big-endian length
//! followed by that many payload bytes, both directions.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use oxidns_domain::DnsError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const MAX_TCP_MESSAGE_SIZE: usize = 65535;

pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DnsError> {
        let mut stream = tokio::time::timeout(timeout, TcpStream::connect(self.server_addr))
            .await
            .map_err(|_| DnsError::Timeout {
                server: self.server_addr.to_string(),
            })?
            .map_err(|e| {
                DnsError::Io(format!(
                    "connection refused by TCP server {}: {}",
                    self.server_addr, e
                ))
            })?;

        tokio::time::timeout(timeout, send_with_length_prefix(&mut stream, message_bytes))
            .await
            .map_err(|_| DnsError::Timeout {
                server: self.server_addr.to_string(),
            })??;

        debug!(
            server = %self.server_addr,
            message_len = message_bytes.len(),
            "TCP query sent"
        );

        let response_bytes = tokio::time::timeout(timeout, read_with_length_prefix(&mut stream))
            .await
            .map_err(|_| DnsError::Timeout {
                server: self.server_addr.to_string(),
            })??;

        debug!(
            server = %self.server_addr,
            response_len = response_bytes.len(),
            "TCP response received"
        );

        Ok(TransportResponse {
            bytes: response_bytes,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

/// Writes `uint16_be length || payload` to the stream.
pub async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> Result<(), DnsError>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| DnsError::RangeOverflow {
        field: "stream frame length",
        value: message_bytes.len() as u64,
        max: u16::MAX as u64,
    })?;

    stream
        .write_all(&length.to_be_bytes())
        .await
        .map_err(|e| DnsError::Io(format!("failed to write length prefix: {}", e)))?;
    stream
        .write_all(message_bytes)
        .await
        .map_err(|e| DnsError::Io(format!("failed to write DNS message: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| DnsError::Io(format!("failed to flush stream: {}", e)))?;

    Ok(())
}

/// Reads exactly one `uint16_be length || payload` frame from the stream.
pub async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, DnsError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| DnsError::Io(format!("failed to read frame length: {}", e)))?;

    let frame_len = u16::from_be_bytes(len_buf) as usize;

    if frame_len == 0 {
        return Err(DnsError::Protocol("received empty stream frame".to_string()));
    }
    if frame_len > MAX_TCP_MESSAGE_SIZE {
        return Err(DnsError::Protocol(format!(
            "frame too large: {} bytes (max {})",
            frame_len, MAX_TCP_MESSAGE_SIZE
        )));
    }

    let mut frame = vec![0u8; frame_len];
    stream
        .read_exact(&mut frame)
        .await
        .map_err(|e| DnsError::Io(format!("failed to read frame body: {}", e)))?;

    Ok(frame)
}

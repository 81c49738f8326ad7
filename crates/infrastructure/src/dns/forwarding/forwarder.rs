//! The upstream forwarder, the oracle of last resort.
//!
//! Client queries that do not take the recursion engine, bootstrap
//! queries, and every iterative-walk fallback all end up here.

use crate::dns::transport::{DnsTransport, TcpTransport, UdpTransport, STREAM_TIMEOUT};
use async_trait::async_trait;
use oxidns_application::ports::{Forwarder, TransportKind};
use oxidns_domain::{DnsError, Message};
use std::net::SocketAddr;
use tracing::debug;

pub struct UpstreamForwarder {
    upstream: SocketAddr,
}

impl UpstreamForwarder {
    pub fn new(upstream: SocketAddr) -> Self {
        Self { upstream }
    }

    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }
}

#[async_trait]
impl Forwarder for UpstreamForwarder {
    async fn forward(
        &self,
        query: &Message,
        transport: TransportKind,
    ) -> Result<Message, DnsError> {
        let query_bytes = query.encode()?;

        let response = match transport {
            TransportKind::Datagram => {
                UdpTransport::new(self.upstream)
                    .send(&query_bytes, STREAM_TIMEOUT)
                    .await?
            }
            TransportKind::Stream => {
                TcpTransport::new(self.upstream)
                    .send(&query_bytes, STREAM_TIMEOUT)
                    .await?
            }
        };

        debug!(
            upstream = %self.upstream,
            protocol = response.protocol_used,
            response_len = response.bytes.len(),
            "Upstream response received"
        );

        let message = Message::decode(&response.bytes)?;

        if !message.is_valid_response(query.header.id) {
            return Err(DnsError::Protocol(format!(
                "upstream {} returned RCODE {} for id {:#06x}, expected NoError for id {:#06x}",
                self.upstream, message.header.rcode, message.header.id, query.header.id
            )));
        }

        Ok(message)
    }
}

use async_trait::async_trait;
use oxidns_domain::{DnsError, Message};

/// Which listener a query arrived on, and therefore which transport the
/// upstream leg uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Datagram,
    Stream,
}

/// Port for the upstream forwarder, the oracle of last resort.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Sends the query to the configured upstream and returns its reply,
    /// subject to the valid-response predicate.
    async fn forward(
        &self,
        query: &Message,
        transport: TransportKind,
    ) -> Result<Message, DnsError>;
}

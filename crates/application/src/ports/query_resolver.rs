use async_trait::async_trait;
use oxidns_domain::{DnsError, Message};

/// Port for the recursive resolution engine.
///
/// Takes a client query containing exactly one question and produces the
/// full response message (QR set, transaction id matching the query).
#[async_trait]
pub trait QueryResolver: Send + Sync {
    async fn resolve(&self, query: &Message) -> Result<Message, DnsError>;
}

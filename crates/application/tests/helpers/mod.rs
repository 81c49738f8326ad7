use async_trait::async_trait;
use oxidns_application::ports::{Forwarder, QueryResolver, TransportKind};
use oxidns_domain::{DnsError, Message};
use std::sync::Mutex;

/// Resolver double that records the queries it saw and replays a canned
/// result.
pub struct ScriptedResolver {
    result: Result<Message, DnsError>,
    pub calls: Mutex<Vec<Message>>,
}

impl ScriptedResolver {
    pub fn new(result: Result<Message, DnsError>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl QueryResolver for ScriptedResolver {
    async fn resolve(&self, query: &Message) -> Result<Message, DnsError> {
        self.calls.lock().unwrap().push(query.clone());
        self.result.clone()
    }
}

/// Forwarder double recording the queries and transports it was handed.
pub struct ScriptedForwarder {
    result: Result<Message, DnsError>,
    pub calls: Mutex<Vec<(Message, TransportKind)>>,
}

impl ScriptedForwarder {
    pub fn new(result: Result<Message, DnsError>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Forwarder for ScriptedForwarder {
    async fn forward(
        &self,
        query: &Message,
        transport: TransportKind,
    ) -> Result<Message, DnsError> {
        self.calls.lock().unwrap().push((query.clone(), transport));
        self.result.clone()
    }
}

use async_trait::async_trait;
use oxidns_application::ports::{Forwarder, QueryResolver, TransportKind};
use oxidns_domain::{DnsError, Message};
use oxidns_infrastructure::dns::resolver::NameserverExchange;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::Duration;

/// Builds the response a scripted nameserver gives for a decoded query.
pub type Responder = Box<dyn Fn(&Message) -> Message + Send + Sync>;

/// A scripted peer for driving the iterative walk without sockets. Each
/// nameserver IP maps to a responder closure; addresses with no script
/// behave like unreachable servers.
#[derive(Default)]
pub struct ScriptedExchange {
    responders: HashMap<Ipv4Addr, Responder>,
    pub corrupt_ids: bool,
    pub datagram_calls: Mutex<Vec<Ipv4Addr>>,
}

impl ScriptedExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond<F>(mut self, ip: Ipv4Addr, responder: F) -> Self
    where
        F: Fn(&Message) -> Message + Send + Sync + 'static,
    {
        self.responders.insert(ip, Box::new(responder));
        self
    }

    pub fn with_corrupt_ids(mut self) -> Self {
        self.corrupt_ids = true;
        self
    }

    fn reply(&self, server: SocketAddr, query_bytes: &[u8]) -> Result<Vec<u8>, DnsError> {
        let query = Message::decode(query_bytes)?;
        let ip = match server.ip() {
            IpAddr::V4(v4) => v4,
            IpAddr::V6(_) => {
                return Err(DnsError::Io("scripted exchange is IPv4-only".to_string()))
            }
        };

        let responder = self.responders.get(&ip).ok_or_else(|| DnsError::Timeout {
            server: server.to_string(),
        })?;

        let mut response = responder(&query);
        response.header.qr = true;
        response.header.id = if self.corrupt_ids {
            query.header.id.wrapping_add(1)
        } else {
            query.header.id
        };
        response.encode()
    }
}

#[async_trait]
impl NameserverExchange for ScriptedExchange {
    async fn exchange_datagram(
        &self,
        server: SocketAddr,
        query: &[u8],
        _timeout: Duration,
    ) -> Result<Vec<u8>, DnsError> {
        if let IpAddr::V4(v4) = server.ip() {
            self.datagram_calls.lock().unwrap().push(v4);
        }
        self.reply(server, query)
    }

    async fn exchange_stream(
        &self,
        server: SocketAddr,
        query: &[u8],
        _timeout: Duration,
    ) -> Result<Vec<u8>, DnsError> {
        self.reply(server, query)
    }
}

/// Forwarder double replaying a canned result.
pub struct ScriptedForwarder {
    result: Result<Message, DnsError>,
    pub calls: Mutex<Vec<Message>>,
}

impl ScriptedForwarder {
    pub fn new(result: Result<Message, DnsError>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self::new(Err(DnsError::Timeout {
            server: "upstream".to_string(),
        }))
    }
}

#[async_trait]
impl Forwarder for ScriptedForwarder {
    async fn forward(
        &self,
        query: &Message,
        _transport: TransportKind,
    ) -> Result<Message, DnsError> {
        self.calls.lock().unwrap().push(query.clone());
        let mut result = self.result.clone();
        if let Ok(response) = &mut result {
            response.header.id = query.header.id;
        }
        result
    }
}

/// Resolver double replaying a canned result.
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

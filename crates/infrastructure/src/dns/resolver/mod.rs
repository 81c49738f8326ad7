//! The iterative resolution engine.
//!
//! On a cache miss the resolver walks the delegation tree from the
//! bootstrapped root servers: query a candidate nameserver, follow CNAME
//! chains, accept authoritative answers, chase referrals through glue
//! records, and fall back to the upstream forwarder when the walk comes up
//! empty.

pub mod bootstrap;
pub mod exchange;

pub use exchange::{NameserverExchange, SocketExchange};

use crate::dns::cache::{CacheKey, MessageCache};
use crate::dns::transport::{NAMESERVER_TIMEOUT, STREAM_TIMEOUT};
use async_trait::async_trait;
use oxidns_application::ports::{Forwarder, QueryResolver, TransportKind};
use oxidns_domain::{DnsError, Message, Question, Rcode, RecordClass, RecordType};
use std::collections::HashSet;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Nameservers are queried on the standard DNS port.
const DNS_PORT: u16 = 53;
/// Delegation hops before the walk gives up.
const MAX_DELEGATION_DEPTH: usize = 10;

/// A nameserver the walk may query: hostname plus IPv4 address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootServer {
    pub name: String,
    pub ip: Ipv4Addr,
}

pub struct RecursiveResolver {
    cache: Arc<MessageCache>,
    forwarder: Arc<dyn Forwarder>,
    exchange: Arc<dyn NameserverExchange>,
    roots: OnceLock<Vec<RootServer>>,
}

impl RecursiveResolver {
    pub fn new(
        cache: Arc<MessageCache>,
        forwarder: Arc<dyn Forwarder>,
        exchange: Arc<dyn NameserverExchange>,
    ) -> Self {
        Self {
            cache,
            forwarder,
            exchange,
            roots: OnceLock::new(),
        }
    }

    /// Installs the root-server list. The list is write-once: bootstrap
    /// runs before the listeners start and nothing mutates it afterwards.
    pub fn set_root_servers(&self, servers: Vec<RootServer>) -> bool {
        self.roots.set(servers).is_ok()
    }

    pub fn root_servers(&self) -> &[RootServer] {
        self.roots.get().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entry point for one client query (exactly one question).
    pub async fn resolve_message(&self, query: &Message) -> Result<Message, DnsError> {
        if query.questions.len() != 1 || query.header.qdcount() != 1 {
            return Err(DnsError::Protocol(
                "recursive resolution supports exactly one question".to_string(),
            ));
        }

        let question = query.questions[0].clone();
        let domain = question.name.clone();
        let qtype = question.qtype;
        let key = CacheKey::fingerprint(&domain, qtype);

        if let Some(mut cached) = self.cache.get(&key) {
            info!(domain = %domain, qtype = %qtype, "Cache hit");
            cached.header.id = query.header.id;
            return Ok(cached);
        }

        info!(domain = %domain, qtype = %qtype, "Starting recursive resolution");

        let roots = self.roots.get().cloned().unwrap_or_default();
        let mut cname_chain = HashSet::new();

        match self
            .resolve_with_nameservers(&domain, qtype, roots, 0, &mut cname_chain)
            .await
        {
            Ok(walked) => {
                let mut response = Message {
                    header: Default::default(),
                    questions: vec![question],
                    answers: walked.answers,
                    authority: walked.authority,
                    additional: walked.additional,
                };
                response.header.qr = true;
                response.header.ra = true;
                response.header.aa = walked.header.aa;
                response.header.set_qdcount(1)?;
                response.header.set_ancount(response.answers.len())?;
                response.header.set_nscount(response.authority.len())?;
                response.header.set_arcount(response.additional.len())?;

                self.cache.put(&key, &response);
                response.header.id = query.header.id;
                Ok(response)
            }
            Err(e) => {
                info!(
                    domain = %domain,
                    error = %e,
                    "Iterative resolution failed, falling back to upstream resolver"
                );
                let mut fallback = query.clone();
                fallback.header.qr = false;
                self.forwarder
                    .forward(&fallback, TransportKind::Datagram)
                    .await
            }
        }
    }

    /// Walks one delegation level. Per-nameserver failures advance to the
    /// next sibling; referrals recurse one level deeper.
    fn resolve_with_nameservers<'a>(
        &'a self,
        domain: &'a str,
        qtype: RecordType,
        mut servers: Vec<RootServer>,
        depth: usize,
        cname_chain: &'a mut HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Message, DnsError>> + Send + 'a>> {
        Box::pin(async move {
            if depth >= MAX_DELEGATION_DEPTH {
                return Err(DnsError::ResolutionExhausted);
            }

            while !servers.is_empty() {
                let server = servers.remove(0);

                debug!(
                    nameserver = %server.name,
                    ip = %server.ip,
                    domain = %domain,
                    qtype = %qtype,
                    "Querying nameserver"
                );

                let ns_query = match Message::query(domain, qtype, RecordClass::In, false) {
                    Ok(q) => q,
                    Err(e) => {
                        debug!(error = %e, "Failed to build nameserver query");
                        continue;
                    }
                };
                let outbound_id = ns_query.header.id;

                let ns_resp = match self.query_nameserver(&server, &ns_query).await {
                    Ok(r) => r,
                    Err(e) => {
                        debug!(nameserver = %server.name, error = %e, "Nameserver query failed");
                        continue;
                    }
                };

                if !ns_resp.is_valid_response(outbound_id) {
                    debug!(
                        nameserver = %server.name,
                        rcode = %ns_resp.header.rcode,
                        sent_id = outbound_id,
                        got_id = ns_resp.header.id,
                        "Discarding invalid nameserver response"
                    );
                    continue;
                }

                // CNAME chains are followed for every qtype except CNAME
                // itself.
                if qtype != RecordType::Cname && ns_resp.header.ancount() > 0 {
                    if ns_resp.answers.len() != ns_resp.header.ancount() as usize {
                        debug!(
                            ancount = ns_resp.header.ancount(),
                            answers = ns_resp.answers.len(),
                            "ANCOUNT disagrees with answer section, skipping nameserver"
                        );
                        continue;
                    }
                    if let Some(followed) =
                        self.follow_cname(domain, qtype, &ns_resp, cname_chain).await
                    {
                        return Ok(followed);
                    }
                }

                if ns_resp.header.aa
                    && !ns_resp.answers.is_empty()
                    && ns_resp.answers.len() == ns_resp.header.ancount() as usize
                {
                    info!(
                        domain = %domain,
                        answer_count = ns_resp.answers.len(),
                        "Found authoritative answer"
                    );
                    return Ok(ns_resp);
                }

                // An SOA in authority is "this zone exists, your name does
                // not". Hand it back unchanged.
                if ns_resp
                    .authority
                    .iter()
                    .any(|rr| rr.rtype == RecordType::Soa)
                {
                    debug!(domain = %domain, "Authoritative negative response");
                    return Ok(ns_resp);
                }

                let referred: Vec<String> = ns_resp
                    .authority
                    .iter()
                    .filter(|rr| rr.rtype == RecordType::Ns)
                    .filter_map(|rr| rr.as_ns().ok().map(str::to_string))
                    .collect();

                if !referred.is_empty() {
                    let next = self
                        .gather_referral_targets(domain, &referred, &ns_resp)
                        .await;
                    if next.is_empty() {
                        warn!(
                            authority = ?referred,
                            "No usable nameserver addresses for delegation"
                        );
                        break;
                    }
                    return self
                        .resolve_with_nameservers(domain, qtype, next, depth + 1, cname_chain)
                        .await;
                }
            }

            Err(DnsError::ResolutionExhausted)
        })
    }

    /// Follows a CNAME whose owner matches the queried domain by
    /// re-entering the resolver for its target. Returns `None` when no
    /// matching CNAME exists or the follow could not complete, in which
    /// case the caller keeps working with the response it already has.
    async fn follow_cname(
        &self,
        domain: &str,
        qtype: RecordType,
        ns_resp: &Message,
        cname_chain: &mut HashSet<String>,
    ) -> Option<Message> {
        for answer in &ns_resp.answers {
            if answer.rtype != RecordType::Cname || answer.name != domain {
                continue;
            }

            let target = match answer.as_cname() {
                Ok(t) => t.to_string(),
                Err(e) => {
                    warn!(error = %e, "Failed to read CNAME target");
                    continue;
                }
            };

            if !cname_chain.insert(target.clone()) {
                warn!(domain = %domain, cname = %target, "CNAME loop detected");
                return None;
            }

            debug!(from = %domain, to = %target, "Following CNAME");

            let target_query = match Message::query(&target, qtype, RecordClass::In, false) {
                Ok(q) => q,
                Err(e) => {
                    debug!(error = %e, "Failed to build CNAME target query");
                    return None;
                }
            };

            let target_resp = match self.resolve_message(&target_query).await {
                Ok(r) => r,
                Err(e) => {
                    debug!(cname = %target, error = %e, "Failed to resolve CNAME target");
                    return None;
                }
            };

            if target_resp.header.rcode != Rcode::NoError {
                debug!(
                    cname = %target,
                    rcode = %target_resp.header.rcode,
                    "CNAME target resolution returned an error code"
                );
                return None;
            }

            let mut combined = Message::default();
            combined
                .add_question(Question::new(domain, qtype, RecordClass::In))
                .ok()?;
            combined.answers.push(answer.clone());
            combined.answers.extend(target_resp.answers.iter().cloned());
            combined.authority = target_resp.authority.clone();
            combined.additional = target_resp.additional.clone();
            combined.header.set_ancount(combined.answers.len()).ok()?;
            combined.header.set_nscount(combined.authority.len()).ok()?;
            combined.header.set_arcount(combined.additional.len()).ok()?;

            return Some(combined);
        }

        None
    }

    /// Builds the next candidate list for a referral: IPv4 glue from the
    /// Additional section when present, otherwise the referred names are
    /// resolved themselves (skipping any that would recurse into the very
    /// domain being resolved).
    async fn gather_referral_targets(
        &self,
        domain: &str,
        referred: &[String],
        ns_resp: &Message,
    ) -> Vec<RootServer> {
        let mut targets = Vec::new();

        for additional in &ns_resp.additional {
            if additional.rtype != RecordType::A {
                continue;
            }
            for name in referred {
                if additional.name == *name {
                    if let Ok(ip) = additional.as_a() {
                        targets.push(RootServer {
                            name: name.clone(),
                            ip,
                        });
                    }
                }
            }
        }

        if !targets.is_empty() {
            return targets;
        }

        for name in referred {
            if domain.ends_with(name.as_str()) {
                warn!(
                    domain = %domain,
                    nameserver = %name,
                    "Skipping nameserver resolution to avoid loop"
                );
                continue;
            }

            match self.resolve_nameserver_ips(name).await {
                Ok(ips) => targets.extend(ips.into_iter().map(|ip| RootServer {
                    name: name.clone(),
                    ip,
                })),
                Err(e) => {
                    debug!(nameserver = %name, error = %e, "Failed to resolve nameserver");
                }
            }
        }

        targets
    }

    /// Resolves a glueless nameserver's IPv4 addresses, preferring the
    /// iterative engine and falling back to the upstream forwarder.
    async fn resolve_nameserver_ips(&self, nameserver: &str) -> Result<Vec<Ipv4Addr>, DnsError> {
        let query = Message::query(nameserver, RecordType::A, RecordClass::In, false)?;

        let response = match self.resolve_message(&query).await {
            Ok(r) => r,
            Err(_) => return self.resolve_upstream_a(nameserver).await,
        };

        let ips: Vec<Ipv4Addr> = response
            .answers
            .iter()
            .filter(|rr| rr.rtype == RecordType::A)
            .filter_map(|rr| rr.as_a().ok())
            .collect();

        if ips.is_empty() {
            return Err(DnsError::Protocol(format!(
                "no IPv4 addresses found for nameserver {}",
                nameserver
            )));
        }

        Ok(ips)
    }

    /// One round-trip with a nameserver: datagram first, stream retry on a
    /// truncated reply.
    async fn query_nameserver(
        &self,
        server: &RootServer,
        query: &Message,
    ) -> Result<Message, DnsError> {
        let query_bytes = query.encode()?;
        let addr = SocketAddr::from((server.ip, DNS_PORT));

        let response_bytes = self
            .exchange
            .exchange_datagram(addr, &query_bytes, NAMESERVER_TIMEOUT)
            .await?;
        let response = Message::decode(&response_bytes)?;

        if response.header.tc {
            debug!(
                nameserver = %server.name,
                "Truncated nameserver response, retrying over stream transport"
            );
            let response_bytes = self
                .exchange
                .exchange_stream(addr, &query_bytes, STREAM_TIMEOUT)
                .await?;
            return Message::decode(&response_bytes);
        }

        Ok(response)
    }
}

#[async_trait]
impl QueryResolver for RecursiveResolver {
    async fn resolve(&self, query: &Message) -> Result<Message, DnsError> {
        self.resolve_message(query).await
    }
}

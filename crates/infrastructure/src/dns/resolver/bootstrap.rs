//! Root-server bootstrap.
//!
//! Before the first iterative walk the resolver needs somewhere to start:
//! a single `. NS IN` query to the upstream forwarder yields the root
//! hostnames, their IPv4 addresses come from glue in the Additional
//! section or, failing that, from direct A-queries upstream.

use super::{RecursiveResolver, RootServer};
use oxidns_application::ports::TransportKind;
use oxidns_domain::{DnsError, Message, RecordClass, RecordType};
use std::net::Ipv4Addr;
use tracing::{debug, info, warn};

impl RecursiveResolver {
    /// Populates the root-server list from the upstream resolver. On
    /// failure the list stays empty and every recursive query falls back
    /// to plain forwarding.
    pub async fn bootstrap_root_servers(&self) -> Result<(), DnsError> {
        info!("Bootstrapping root servers from upstream resolver");

        let query = Message::query(".", RecordType::Ns, RecordClass::In, true)?;
        let response = self
            .forwarder
            .forward(&query, TransportKind::Datagram)
            .await?;

        let mut ns_names: Vec<String> = Vec::new();
        for record in response.answers.iter().chain(&response.authority) {
            if record.rtype != RecordType::Ns {
                continue;
            }
            match record.as_ns() {
                Ok(name) => ns_names.push(name.to_string()),
                Err(e) => warn!(error = %e, "Failed to parse NS record for root server"),
            }
        }

        let mut roots: Vec<RootServer> = Vec::new();
        for additional in &response.additional {
            if additional.rtype != RecordType::A {
                continue;
            }
            for name in &ns_names {
                if additional.name == *name {
                    match additional.as_a() {
                        Ok(ip) => {
                            debug!(name = %name, ip = %ip, "Found root server");
                            roots.push(RootServer {
                                name: name.clone(),
                                ip,
                            });
                        }
                        Err(e) => {
                            warn!(name = %name, error = %e, "Failed to parse root server glue")
                        }
                    }
                }
            }
        }

        // Root hostnames without glue get resolved the slow way.
        if roots.is_empty() {
            for name in &ns_names {
                match self.resolve_upstream_a(name).await {
                    Ok(ips) => {
                        for ip in ips {
                            debug!(name = %name, ip = %ip, "Resolved root server");
                            roots.push(RootServer {
                                name: name.clone(),
                                ip,
                            });
                        }
                    }
                    Err(e) => warn!(name = %name, error = %e, "Failed to resolve root server IP"),
                }
            }
        }

        if roots.is_empty() {
            return Err(DnsError::Protocol(
                "could not bootstrap any root server".to_string(),
            ));
        }

        let count = roots.len();
        self.set_root_servers(roots);
        info!(count, "Root servers bootstrapped successfully");
        Ok(())
    }

    /// Resolves a hostname's IPv4 addresses with a direct A-query to the
    /// upstream resolver.
    pub(crate) async fn resolve_upstream_a(&self, name: &str) -> Result<Vec<Ipv4Addr>, DnsError> {
        let query = Message::query(name, RecordType::A, RecordClass::In, true)?;
        let response = self
            .forwarder
            .forward(&query, TransportKind::Datagram)
            .await?;

        if response.answers.len() != response.header.ancount() as usize {
            return Err(DnsError::Protocol(format!(
                "ANCOUNT {} disagrees with {} answers",
                response.header.ancount(),
                response.answers.len()
            )));
        }

        let ips: Vec<Ipv4Addr> = response
            .answers
            .iter()
            .filter(|rr| rr.rtype == RecordType::A)
            .filter_map(|rr| rr.as_a().ok())
            .collect();

        if ips.is_empty() {
            return Err(DnsError::Protocol(format!(
                "no IP addresses found for nameserver {}",
                name
            )));
        }

        Ok(ips)
    }
}

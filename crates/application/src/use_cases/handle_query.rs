use crate::ports::{Forwarder, QueryResolver, TransportKind};
use oxidns_domain::{DnsError, Message, Rcode};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Routes each inbound query to the recursion engine or the upstream
/// forwarder, applying the single-question policy on the way in.
pub struct HandleQueryUseCase {
    resolver: Arc<dyn QueryResolver>,
    forwarder: Arc<dyn Forwarder>,
    recursion_enabled: bool,
}

impl HandleQueryUseCase {
    pub fn new(
        resolver: Arc<dyn QueryResolver>,
        forwarder: Arc<dyn Forwarder>,
        recursion_enabled: bool,
    ) -> Self {
        Self {
            resolver,
            forwarder,
            recursion_enabled,
        }
    }

    pub async fn execute(
        &self,
        query: Message,
        transport: TransportKind,
    ) -> Result<Message, DnsError> {
        let mut query = query;

        if query.questions.is_empty() || query.header.qdcount() == 0 {
            return Err(DnsError::Protocol(
                "query contains no questions".to_string(),
            ));
        }

        // No deployed resolver sends more than one question; collapse to
        // the first rather than trying to merge answers across questions.
        if query.questions.len() > 1 || query.header.qdcount() > 1 {
            warn!(
                question_count = query.questions.len(),
                "Multiple questions in query, only processing the first one"
            );
            query.questions.truncate(1);
            query.header.set_qdcount(1)?;
        }

        debug!(
            question = %query.questions[0].name,
            qtype = %query.questions[0].qtype,
            "Dispatching query"
        );

        if query.header.rd && self.recursion_enabled {
            let response = self.resolver.resolve(&query).await?;
            if response.header.rcode != Rcode::NoError {
                return Err(DnsError::Protocol(format!(
                    "unexpected RCODE {} after recursive resolution",
                    response.header.rcode
                )));
            }
            Ok(response)
        } else {
            query.header.qr = false;
            let response = self.forwarder.forward(&query, transport).await?;

            if response.header.tc {
                info!(
                    question = %query.questions[0].name,
                    "Upstream response truncated, preserving TC for the client to retry over TCP"
                );
            }

            Ok(response)
        }
    }
}

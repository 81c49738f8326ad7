//! Per-request glue between the listeners and the dispatcher.
//!
//! Decodes inbound packets, runs the use case, shapes RCODE error replies,
//! and clamps oversized datagram responses with the TC flag.

use crate::dns::transport::MAX_DATAGRAM_SIZE;
use oxidns_application::ports::TransportKind;
use oxidns_application::use_cases::HandleQueryUseCase;
use oxidns_domain::{Header, Message, Rcode};
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct DnsServerHandler {
    use_case: Arc<HandleQueryUseCase>,
}

enum Outcome {
    Reply(Message),
    Failed(Rcode),
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleQueryUseCase>) -> Self {
        Self { use_case }
    }

    /// Handles one datagram query. A response that would not fit in a
    /// datagram is re-encoded with TC set so the client retries over the
    /// stream transport.
    pub async fn handle_datagram(&self, data: &[u8]) -> Option<Vec<u8>> {
        let response = match self.process(data, TransportKind::Datagram).await {
            Outcome::Reply(response) => response,
            Outcome::Failed(rcode) => return self.error_response(data, rcode),
        };

        let mut bytes = match response.encode() {
            Ok(b) => b,
            Err(e) => {
                error!(error = %e, "Failed to encode response");
                return self.error_response(data, Rcode::ServerFailure);
            }
        };

        if bytes.len() > MAX_DATAGRAM_SIZE {
            info!(
                response_len = bytes.len(),
                "Response exceeds datagram limit, setting TC"
            );
            let mut truncated = response;
            truncated.header.tc = true;
            bytes = match truncated.encode() {
                Ok(b) => b,
                Err(e) => {
                    error!(error = %e, "Failed to re-encode truncated response");
                    return self.error_response(data, Rcode::ServerFailure);
                }
            };
        }

        Some(bytes)
    }

    /// Handles one stream-framed query. Stream responses are never
    /// truncated.
    pub async fn handle_stream(&self, data: &[u8]) -> Option<Vec<u8>> {
        let response = match self.process(data, TransportKind::Stream).await {
            Outcome::Reply(response) => response,
            Outcome::Failed(rcode) => return self.error_response(data, rcode),
        };

        match response.encode() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(error = %e, "Failed to encode response");
                self.error_response(data, Rcode::ServerFailure)
            }
        }
    }

    async fn process(&self, data: &[u8], transport: TransportKind) -> Outcome {
        let query = match Message::decode(data) {
            Ok(q) => q,
            Err(e) => {
                error!(error = %e, "Failed to decode query");
                return Outcome::Failed(Rcode::FormatError);
            }
        };

        if query.questions.is_empty() || query.header.qdcount() == 0 {
            error!("Query contains no questions");
            return Outcome::Failed(Rcode::FormatError);
        }

        debug!(
            question = %query.questions[0].name,
            qtype = %query.questions[0].qtype,
            "Received query"
        );

        match self.use_case.execute(query.clone(), transport).await {
            Ok(mut response) => {
                response.header.id = query.header.id;
                Outcome::Reply(response)
            }
            Err(e) => {
                error!(
                    question = %query.questions[0].name,
                    error = %e,
                    "Query handling failed"
                );
                Outcome::Failed(Rcode::ServerFailure)
            }
        }
    }

    /// Builds an error reply from whatever can still be salvaged from the
    /// inbound packet: the original header and questions where decodable,
    /// a blank header otherwise.
    fn error_response(&self, data: &[u8], rcode: Rcode) -> Option<Vec<u8>> {
        let mut header = Header::decode(data).unwrap_or_default();
        header.qr = true;
        header.rcode = rcode;

        let questions = Message::decode(data)
            .map(|msg| msg.questions)
            .unwrap_or_default();

        let response = Message {
            header,
            questions,
            ..Default::default()
        };

        match response.encode() {
            Ok(bytes) => {
                debug!(rcode = %rcode, "Sending error response");
                Some(bytes)
            }
            Err(e) => {
                error!(error = %e, "Failed to encode error response");
                None
            }
        }
    }
}

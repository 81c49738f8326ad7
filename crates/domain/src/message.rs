//! The four-section message envelope.

use crate::errors::DnsError;
use crate::header::{Header, Rcode, HEADER_LEN};
use crate::question::Question;
use crate::record::ResourceRecord;
use crate::record_type::{RecordClass, RecordType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// Builds a fresh query with a randomised transaction id and a single
    /// question.
    pub fn query(
        name: impl Into<String>,
        qtype: RecordType,
        class: RecordClass,
        recursion_desired: bool,
    ) -> Result<Message, DnsError> {
        let mut msg = Message::default();
        msg.header.randomize_id();
        msg.header.qr = false;
        msg.header.rd = recursion_desired;
        msg.add_question(Question::new(name, qtype, class))?;
        Ok(msg)
    }

    pub fn add_question(&mut self, question: Question) -> Result<(), DnsError> {
        self.questions.push(question);
        self.header.set_qdcount(self.questions.len())
    }

    /// The valid-response predicate applied at every boundary with a peer:
    /// RCODE must be NoError and the transaction id must echo the query.
    ///
    /// A stricter reading would treat the id alone as the transport check
    /// and let authoritative negatives (NXDOMAIN) through; this follows
    /// the failover-on-any-RCODE behaviour instead.
    pub fn is_valid_response(&self, expected_id: u16) -> bool {
        self.header.rcode == Rcode::NoError && self.header.id == expected_id
    }

    /// Minimum TTL across the answer section, if any answers are present.
    pub fn min_answer_ttl(&self) -> Option<u32> {
        self.answers.iter().map(|rr| rr.ttl).min()
    }

    /// Serialises the message. The emitted section counts are taken from
    /// the actual section lengths, whatever the stored header says.
    pub fn encode(&self) -> Result<Vec<u8>, DnsError> {
        let mut header = self.header;
        header.set_qdcount(self.questions.len())?;
        header.set_ancount(self.answers.len())?;
        header.set_nscount(self.authority.len())?;
        header.set_arcount(self.additional.len())?;

        let mut buf = header.encode().to_vec();

        for question in &self.questions {
            let encoded = question.encode(&buf)?;
            buf.extend_from_slice(&encoded);
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authority)
            .chain(&self.additional)
        {
            let encoded = record.encode(&buf)?;
            buf.extend_from_slice(&encoded);
        }

        Ok(buf)
    }

    pub fn decode(buf: &[u8]) -> Result<Message, DnsError> {
        if buf.is_empty() {
            return Err(DnsError::Truncated("empty message buffer".to_string()));
        }

        let header = Header::decode(buf)?;
        let mut offset = HEADER_LEN;

        let mut questions = Vec::with_capacity(header.qdcount() as usize);
        for _ in 0..header.qdcount() {
            let (question, consumed) = Question::decode(buf, offset, buf)?;
            questions.push(question);
            offset += consumed;
        }

        let mut decode_section = |count: u16| -> Result<Vec<ResourceRecord>, DnsError> {
            let mut records = Vec::with_capacity(count as usize);
            for _ in 0..count {
                if offset >= buf.len() {
                    return Err(DnsError::Truncated(
                        "buffer ended before section was complete".to_string(),
                    ));
                }
                let (record, consumed) = ResourceRecord::decode(buf, offset, buf)?;
                records.push(record);
                offset += consumed;
            }
            Ok(records)
        };

        let answers = decode_section(header.ancount())?;
        let authority = decode_section(header.nscount())?;
        let additional = decode_section(header.arcount())?;

        Ok(Message {
            header,
            questions,
            answers,
            authority,
            additional,
        })
    }

    /// Clones the message into a fully-owned value with section counts
    /// reseated. Record payloads are already owned (see [`crate::record`]),
    /// so the copy shares nothing with any packet buffer.
    pub fn deep_copy(&self) -> Result<Message, DnsError> {
        let mut copy = self.clone();
        copy.header.set_qdcount(copy.questions.len())?;
        copy.header.set_ancount(copy.answers.len())?;
        copy.header.set_nscount(copy.authority.len())?;
        copy.header.set_arcount(copy.additional.len())?;
        Ok(copy)
    }
}

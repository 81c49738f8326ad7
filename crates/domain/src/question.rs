//! Question section entry: NAME, TYPE(2), CLASS(2).

use crate::errors::DnsError;
use crate::name;
use crate::record_type::{RecordClass, RecordType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub qtype: RecordType,
    pub class: RecordClass,
}

impl Question {
    pub fn new(name: impl Into<String>, qtype: RecordType, class: RecordClass) -> Self {
        Self {
            name: name.into(),
            qtype,
            class,
        }
    }

    /// Encodes the question, compressing the name against the packet
    /// already written.
    pub fn encode(&self, packet_so_far: &[u8]) -> Result<Vec<u8>, DnsError> {
        let mut buf = name::encode_name(&self.name, packet_so_far)?;
        buf.extend_from_slice(&self.qtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.class.to_u16().to_be_bytes());
        Ok(buf)
    }

    /// Decodes a question starting at `offset` within `buffer`, returning
    /// it together with the bytes consumed at that position. Pointers in
    /// the name are resolved against `full_packet`.
    pub fn decode(
        buffer: &[u8],
        offset: usize,
        full_packet: &[u8],
    ) -> Result<(Question, usize), DnsError> {
        let (qname, name_len) = name::decode_name(buffer, offset, full_packet)?;
        let fixed_start = offset + name_len;

        if buffer.len() < fixed_start + 4 {
            return Err(DnsError::Truncated(
                "question missing type and class bytes".to_string(),
            ));
        }

        let qtype = RecordType::from_u16(u16::from_be_bytes([
            buffer[fixed_start],
            buffer[fixed_start + 1],
        ]));
        let class = RecordClass::from_u16(u16::from_be_bytes([
            buffer[fixed_start + 2],
            buffer[fixed_start + 3],
        ]));

        Ok((
            Question {
                name: qname,
                qtype,
                class,
            },
            name_len + 4,
        ))
    }
}

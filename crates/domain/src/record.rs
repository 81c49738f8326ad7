//! Resource records: NAME, TYPE(2), CLASS(2), TTL(4), RDLENGTH(2), RDATA.
//!
//! The rdata payload is a discriminated union selected by the record type.
//! Every variant owns its data, so a decoded record carries no references
//! into the packet it came from, which is what lets the cache hold
//! records past the lifetime of the original datagram buffer.

use crate::errors::DnsError;
use crate::name;
use crate::record_type::{RecordClass, RecordType};
use std::net::Ipv4Addr;

/// Type, class, TTL and RDLENGTH bytes between the owner name and rdata.
const FIXED_FIELDS_LEN: usize = 10;

/// Semantically-typed rdata payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RData {
    /// 4-octet IPv4 address.
    A(Ipv4Addr),
    Ns(String),
    Cname(String),
    Ptr(String),
    Mx { preference: u16, exchange: String },
    Soa {
        mname: String,
        rname: String,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    /// Character strings joined on read, re-chunked on write.
    Txt(String),
    /// Verbatim payload for every other type.
    Other(Vec<u8>),
}

impl RData {
    /// Serialises the payload. Names embedded in rdata are written
    /// uncompressed so the blob stays position-independent.
    pub fn encode(&self) -> Result<Vec<u8>, DnsError> {
        match self {
            RData::A(ip) => Ok(ip.octets().to_vec()),
            RData::Ns(target) | RData::Cname(target) | RData::Ptr(target) => {
                name::encode_name_uncompressed(target)
            }
            RData::Mx {
                preference,
                exchange,
            } => {
                let mut buf = preference.to_be_bytes().to_vec();
                buf.extend(name::encode_name_uncompressed(exchange)?);
                Ok(buf)
            }
            RData::Soa {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                let mut buf = name::encode_name_uncompressed(mname)?;
                buf.extend(name::encode_name_uncompressed(rname)?);
                for value in [serial, refresh, retry, expire, minimum] {
                    buf.extend_from_slice(&value.to_be_bytes());
                }
                Ok(buf)
            }
            RData::Txt(text) => {
                let mut buf = Vec::with_capacity(text.len() + 1);
                let bytes = text.as_bytes();
                if bytes.is_empty() {
                    buf.push(0);
                }
                for chunk in bytes.chunks(u8::MAX as usize) {
                    buf.push(chunk.len() as u8);
                    buf.extend_from_slice(chunk);
                }
                Ok(buf)
            }
            RData::Other(blob) => Ok(blob.clone()),
        }
    }

    /// Interprets a raw rdata slice according to the record type. Types
    /// whose rdata embeds names (NS, CNAME, PTR, MX, SOA) get the name
    /// decoder pointed at the slice but carrying the full packet, because
    /// a pointer inside rdata may legally target any earlier position.
    pub fn decode(
        rtype: RecordType,
        rdata: &[u8],
        full_packet: &[u8],
    ) -> Result<RData, DnsError> {
        match rtype {
            RecordType::A => {
                if rdata.len() != 4 {
                    return Err(DnsError::MalformedName(format!(
                        "A record rdata is {} bytes, expected 4",
                        rdata.len()
                    )));
                }
                Ok(RData::A(Ipv4Addr::new(
                    rdata[0], rdata[1], rdata[2], rdata[3],
                )))
            }
            RecordType::Ns => {
                let (target, _) = name::decode_name(rdata, 0, full_packet)?;
                Ok(RData::Ns(target))
            }
            RecordType::Cname => {
                let (target, _) = name::decode_name(rdata, 0, full_packet)?;
                Ok(RData::Cname(target))
            }
            RecordType::Ptr => {
                let (target, _) = name::decode_name(rdata, 0, full_packet)?;
                Ok(RData::Ptr(target))
            }
            RecordType::Mx => {
                if rdata.len() < 3 {
                    return Err(DnsError::Truncated(format!(
                        "MX rdata is {} bytes, expected at least 3",
                        rdata.len()
                    )));
                }
                let preference = u16::from_be_bytes([rdata[0], rdata[1]]);
                let (exchange, _) = name::decode_name(rdata, 2, full_packet)?;
                Ok(RData::Mx {
                    preference,
                    exchange,
                })
            }
            RecordType::Soa => {
                let (mname, mname_len) = name::decode_name(rdata, 0, full_packet)?;
                let (rname, rname_len) = name::decode_name(rdata, mname_len, full_packet)?;
                let fields_start = mname_len + rname_len;

                if rdata.len() < fields_start + 20 {
                    return Err(DnsError::Truncated(
                        "SOA rdata missing interval fields".to_string(),
                    ));
                }

                let u32_at = |i: usize| {
                    u32::from_be_bytes([
                        rdata[fields_start + i],
                        rdata[fields_start + i + 1],
                        rdata[fields_start + i + 2],
                        rdata[fields_start + i + 3],
                    ])
                };

                Ok(RData::Soa {
                    mname,
                    rname,
                    serial: u32_at(0),
                    refresh: u32_at(4),
                    retry: u32_at(8),
                    expire: u32_at(12),
                    minimum: u32_at(16),
                })
            }
            RecordType::Txt => {
                let mut joined = String::new();
                let mut offset = 0usize;
                while offset < rdata.len() {
                    let chunk_len = rdata[offset] as usize;
                    offset += 1;
                    if offset + chunk_len > rdata.len() {
                        return Err(DnsError::Truncated(
                            "TXT string length exceeds rdata".to_string(),
                        ));
                    }
                    joined.push_str(&String::from_utf8_lossy(&rdata[offset..offset + chunk_len]));
                    offset += chunk_len;
                }
                Ok(RData::Txt(joined))
            }
            _ => Ok(RData::Other(rdata.to_vec())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub rtype: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub rdata: RData,
}

impl ResourceRecord {
    pub fn new(
        name: impl Into<String>,
        rtype: RecordType,
        class: RecordClass,
        ttl: u32,
        rdata: RData,
    ) -> Self {
        Self {
            name: name.into(),
            rtype,
            class,
            ttl,
            rdata,
        }
    }

    pub fn a(name: impl Into<String>, ttl: u32, ip: Ipv4Addr) -> Self {
        Self::new(name, RecordType::A, RecordClass::In, ttl, RData::A(ip))
    }

    pub fn ns(name: impl Into<String>, ttl: u32, target: impl Into<String>) -> Self {
        Self::new(
            name,
            RecordType::Ns,
            RecordClass::In,
            ttl,
            RData::Ns(target.into()),
        )
    }

    pub fn cname(name: impl Into<String>, ttl: u32, target: impl Into<String>) -> Self {
        Self::new(
            name,
            RecordType::Cname,
            RecordClass::In,
            ttl,
            RData::Cname(target.into()),
        )
    }

    pub fn set_ttl(&mut self, ttl: u64) -> Result<(), DnsError> {
        self.ttl = u32::try_from(ttl).map_err(|_| DnsError::RangeOverflow {
            field: "TTL",
            value: ttl,
            max: u32::MAX as u64,
        })?;
        Ok(())
    }

    pub fn as_a(&self) -> Result<Ipv4Addr, DnsError> {
        match &self.rdata {
            RData::A(ip) if self.rtype == RecordType::A => Ok(*ip),
            _ => Err(self.mismatch(RecordType::A)),
        }
    }

    pub fn as_ns(&self) -> Result<&str, DnsError> {
        match &self.rdata {
            RData::Ns(target) if self.rtype == RecordType::Ns => Ok(target),
            _ => Err(self.mismatch(RecordType::Ns)),
        }
    }

    pub fn as_cname(&self) -> Result<&str, DnsError> {
        match &self.rdata {
            RData::Cname(target) if self.rtype == RecordType::Cname => Ok(target),
            _ => Err(self.mismatch(RecordType::Cname)),
        }
    }

    pub fn as_ptr(&self) -> Result<&str, DnsError> {
        match &self.rdata {
            RData::Ptr(target) if self.rtype == RecordType::Ptr => Ok(target),
            _ => Err(self.mismatch(RecordType::Ptr)),
        }
    }

    pub fn as_mx(&self) -> Result<(u16, &str), DnsError> {
        match &self.rdata {
            RData::Mx {
                preference,
                exchange,
            } if self.rtype == RecordType::Mx => Ok((*preference, exchange)),
            _ => Err(self.mismatch(RecordType::Mx)),
        }
    }

    pub fn as_soa(&self) -> Result<&RData, DnsError> {
        match &self.rdata {
            soa @ RData::Soa { .. } if self.rtype == RecordType::Soa => Ok(soa),
            _ => Err(self.mismatch(RecordType::Soa)),
        }
    }

    pub fn as_txt(&self) -> Result<&str, DnsError> {
        match &self.rdata {
            RData::Txt(text) if self.rtype == RecordType::Txt => Ok(text),
            _ => Err(self.mismatch(RecordType::Txt)),
        }
    }

    fn mismatch(&self, expected: RecordType) -> DnsError {
        DnsError::TypeMismatch {
            expected,
            actual: self.rtype,
        }
    }

    /// Encodes the record, compressing the owner name against the packet
    /// written so far. RDLENGTH is computed from the encoded payload.
    pub fn encode(&self, packet_so_far: &[u8]) -> Result<Vec<u8>, DnsError> {
        let mut buf = name::encode_name(&self.name, packet_so_far)?;
        let rdata = self.rdata.encode()?;
        let rdlength = u16::try_from(rdata.len()).map_err(|_| DnsError::RangeOverflow {
            field: "RDLENGTH",
            value: rdata.len() as u64,
            max: u16::MAX as u64,
        })?;

        buf.extend_from_slice(&self.rtype.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.class.to_u16().to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&rdlength.to_be_bytes());
        buf.extend_from_slice(&rdata);
        Ok(buf)
    }

    /// Decodes a record starting at `offset` within `buffer`, returning it
    /// together with the bytes consumed at that position.
    pub fn decode(
        buffer: &[u8],
        offset: usize,
        full_packet: &[u8],
    ) -> Result<(ResourceRecord, usize), DnsError> {
        let (owner, name_len) = name::decode_name(buffer, offset, full_packet)?;
        let fixed_start = offset + name_len;

        if buffer.len() < fixed_start + FIXED_FIELDS_LEN {
            return Err(DnsError::Truncated(
                "record missing type, class, TTL or RDLENGTH".to_string(),
            ));
        }

        let rtype = RecordType::from_u16(u16::from_be_bytes([
            buffer[fixed_start],
            buffer[fixed_start + 1],
        ]));
        let class = RecordClass::from_u16(u16::from_be_bytes([
            buffer[fixed_start + 2],
            buffer[fixed_start + 3],
        ]));
        let ttl = u32::from_be_bytes([
            buffer[fixed_start + 4],
            buffer[fixed_start + 5],
            buffer[fixed_start + 6],
            buffer[fixed_start + 7],
        ]);
        let rdlength = u16::from_be_bytes([buffer[fixed_start + 8], buffer[fixed_start + 9]])
            as usize;

        let rdata_start = fixed_start + FIXED_FIELDS_LEN;
        if buffer.len() < rdata_start + rdlength {
            return Err(DnsError::Truncated(format!(
                "record rdata requires {} bytes past offset {}",
                rdlength, rdata_start
            )));
        }

        let rdata = RData::decode(rtype, &buffer[rdata_start..rdata_start + rdlength], full_packet)?;

        Ok((
            ResourceRecord {
                name: owner,
                rtype,
                class,
                ttl,
                rdata,
            },
            name_len + FIXED_FIELDS_LEN + rdlength,
        ))
    }
}

use std::fmt;
use std::str::FromStr;

/// Resource record types from RFC 1035 §3.2.2. Values outside the
/// original table (AAAA, OPT, ...) are carried through `Unknown` so any
/// packet round-trips losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Ns,
    Md,
    Mf,
    Cname,
    Soa,
    Mb,
    Mg,
    Mr,
    Null,
    Wks,
    Ptr,
    Hinfo,
    Minfo,
    Mx,
    Txt,
    Unknown(u16),
}

impl RecordType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => RecordType::A,
            2 => RecordType::Ns,
            3 => RecordType::Md,
            4 => RecordType::Mf,
            5 => RecordType::Cname,
            6 => RecordType::Soa,
            7 => RecordType::Mb,
            8 => RecordType::Mg,
            9 => RecordType::Mr,
            10 => RecordType::Null,
            11 => RecordType::Wks,
            12 => RecordType::Ptr,
            13 => RecordType::Hinfo,
            14 => RecordType::Minfo,
            15 => RecordType::Mx,
            16 => RecordType::Txt,
            other => RecordType::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Ns => 2,
            RecordType::Md => 3,
            RecordType::Mf => 4,
            RecordType::Cname => 5,
            RecordType::Soa => 6,
            RecordType::Mb => 7,
            RecordType::Mg => 8,
            RecordType::Mr => 9,
            RecordType::Null => 10,
            RecordType::Wks => 11,
            RecordType::Ptr => 12,
            RecordType::Hinfo => 13,
            RecordType::Minfo => 14,
            RecordType::Mx => 15,
            RecordType::Txt => 16,
            RecordType::Unknown(other) => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Ns => "NS",
            RecordType::Md => "MD",
            RecordType::Mf => "MF",
            RecordType::Cname => "CNAME",
            RecordType::Soa => "SOA",
            RecordType::Mb => "MB",
            RecordType::Mg => "MG",
            RecordType::Mr => "MR",
            RecordType::Null => "NULL",
            RecordType::Wks => "WKS",
            RecordType::Ptr => "PTR",
            RecordType::Hinfo => "HINFO",
            RecordType::Minfo => "MINFO",
            RecordType::Mx => "MX",
            RecordType::Txt => "TXT",
            RecordType::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Unknown(value) => write!(f, "TYPE{}", value),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "NS" => Ok(RecordType::Ns),
            "MD" => Ok(RecordType::Md),
            "MF" => Ok(RecordType::Mf),
            "CNAME" => Ok(RecordType::Cname),
            "SOA" => Ok(RecordType::Soa),
            "MB" => Ok(RecordType::Mb),
            "MG" => Ok(RecordType::Mg),
            "MR" => Ok(RecordType::Mr),
            "NULL" => Ok(RecordType::Null),
            "WKS" => Ok(RecordType::Wks),
            "PTR" => Ok(RecordType::Ptr),
            "HINFO" => Ok(RecordType::Hinfo),
            "MINFO" => Ok(RecordType::Minfo),
            "MX" => Ok(RecordType::Mx),
            "TXT" => Ok(RecordType::Txt),
            _ => Err(format!("Invalid record type: {}", s)),
        }
    }
}

/// Record classes from RFC 1035 §3.2.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    In,
    Cs,
    Ch,
    Hs,
    Unknown(u16),
}

impl RecordClass {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => RecordClass::In,
            2 => RecordClass::Cs,
            3 => RecordClass::Ch,
            4 => RecordClass::Hs,
            other => RecordClass::Unknown(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            RecordClass::In => 1,
            RecordClass::Cs => 2,
            RecordClass::Ch => 3,
            RecordClass::Hs => 4,
            RecordClass::Unknown(other) => other,
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::In => write!(f, "IN"),
            RecordClass::Cs => write!(f, "CS"),
            RecordClass::Ch => write!(f, "CH"),
            RecordClass::Hs => write!(f, "HS"),
            RecordClass::Unknown(value) => write!(f, "CLASS{}", value),
        }
    }
}

pub mod errors;
pub mod header;
pub mod message;
pub mod name;
pub mod question;
pub mod record;
pub mod record_type;

pub use errors::DnsError;
pub use header::{Header, Opcode, Rcode};
pub use message::Message;
pub use question::Question;
pub use record::{RData, ResourceRecord};
pub use record_type::{RecordClass, RecordType};

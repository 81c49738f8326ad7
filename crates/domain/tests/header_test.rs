use oxidns_domain::errors::DnsError;
use oxidns_domain::header::{Header, Opcode, Rcode, HEADER_LEN};

#[test]
fn test_header_round_trip() {
    let mut header = Header::new();
    header.id = 0xBEEF;
    header.qr = true;
    header.opcode = Opcode::IQuery;
    header.aa = true;
    header.tc = false;
    header.rd = true;
    header.ra = true;
    header.set_z(5).unwrap();
    header.rcode = Rcode::Refused;
    header.set_qdcount(1).unwrap();
    header.set_ancount(2).unwrap();
    header.set_nscount(3).unwrap();
    header.set_arcount(4).unwrap();

    let decoded = Header::decode(&header.encode()).unwrap();
    assert_eq!(decoded, header);
}

#[test]
fn test_flags_bit_layout() {
    let mut header = Header::new();
    header.id = 0x1234;
    header.qr = true;
    header.opcode = Opcode::Status;
    header.tc = true;
    header.rd = true;
    header.ra = true;
    header.rcode = Rcode::NameError;
    header.set_qdcount(1).unwrap();

    let bytes = header.encode();
    assert_eq!(&bytes[0..2], &[0x12, 0x34]);
    // QR<<7 | OPCODE<<3 | AA<<2 | TC<<1 | RD
    assert_eq!(bytes[2], 0b1001_0011);
    // RA<<7 | Z<<4 | RCODE
    assert_eq!(bytes[3], 0b1000_0011);
    assert_eq!(&bytes[4..6], &[0x00, 0x01]);
}

#[test]
fn test_decode_all_flag_fields() {
    let bytes: [u8; HEADER_LEN] = [
        0xAB, 0xCD, // id
        0b1000_0101, // QR=1, opcode=0, AA=1, TC=0, RD=1
        0b0111_0010, // RA=0, Z=7, RCODE=2
        0, 1, 0, 2, 0, 3, 0, 4,
    ];

    let header = Header::decode(&bytes).unwrap();
    assert_eq!(header.id, 0xABCD);
    assert!(header.qr);
    assert_eq!(header.opcode, Opcode::Query);
    assert!(header.aa);
    assert!(!header.tc);
    assert!(header.rd);
    assert!(!header.ra);
    assert_eq!(header.z(), 7);
    assert_eq!(header.rcode, Rcode::ServerFailure);
    assert_eq!(header.qdcount(), 1);
    assert_eq!(header.ancount(), 2);
    assert_eq!(header.nscount(), 3);
    assert_eq!(header.arcount(), 4);
}

#[test]
fn test_decode_short_buffer_fails() {
    let err = Header::decode(&[0u8; 11]).unwrap_err();
    assert!(matches!(err, DnsError::Truncated(_)));
}

#[test]
fn test_count_setters_reject_overflow() {
    let mut header = Header::new();
    let err = header.set_qdcount(usize::from(u16::MAX) + 1).unwrap_err();
    assert!(matches!(err, DnsError::RangeOverflow { field: "QDCOUNT", .. }));

    let err = header.set_ancount(1 << 20).unwrap_err();
    assert!(matches!(err, DnsError::RangeOverflow { field: "ANCOUNT", .. }));

    assert!(header.set_nscount(u16::MAX as usize).is_ok());
}

#[test]
fn test_z_setter_rejects_values_above_three_bits() {
    let mut header = Header::new();
    assert!(header.set_z(7).is_ok());
    let err = header.set_z(8).unwrap_err();
    assert!(matches!(err, DnsError::RangeOverflow { field: "Z", .. }));
}

#[test]
fn test_randomized_ids_vary() {
    let mut seen = std::collections::HashSet::new();
    for _ in 0..64 {
        let mut header = Header::new();
        header.randomize_id();
        seen.insert(header.id);
    }
    assert!(seen.len() > 1);
}

use oxidns_domain::DnsError;
use oxidns_infrastructure::dns::transport::{
    read_with_length_prefix, send_with_length_prefix, DnsTransport, TcpTransport, UdpTransport,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

#[tokio::test]
async fn test_udp_round_trip() {
    let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server_addr = server.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf = [0u8; 512];
        let (n, from) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"query");
        server.send_to(b"reply", from).await.unwrap();
    });

    let transport = UdpTransport::new(server_addr);
    let response = transport
        .send(b"query", Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(response.bytes, b"reply");
    assert_eq!(response.protocol_used, "UDP");
}

#[tokio::test]
async fn test_udp_timeout() {
    // Nothing listens on this socket's peer side, so the receive times out.
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let server_addr = silent.local_addr().unwrap();

    let transport = UdpTransport::new(server_addr);
    let err = transport
        .send(b"query", Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, DnsError::Timeout { .. }));
}

#[tokio::test]
async fn test_tcp_round_trip_is_length_prefixed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut len_buf = [0u8; 2];
        stream.read_exact(&mut len_buf).await.unwrap();
        let len = u16::from_be_bytes(len_buf) as usize;
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).await.unwrap();
        assert_eq!(payload, b"question");

        stream.write_all(&6u16.to_be_bytes()).await.unwrap();
        stream.write_all(b"answer").await.unwrap();
    });

    let transport = TcpTransport::new(server_addr);
    let response = transport
        .send(b"question", Duration::from_secs(2))
        .await
        .unwrap();
    assert_eq!(response.bytes, b"answer");
    assert_eq!(response.protocol_used, "TCP");
}

#[tokio::test]
async fn test_tcp_timeout_on_silent_server() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        // Accept, read the frame, never answer.
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 64];
        let _ = stream.read(&mut buf).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let transport = TcpTransport::new(server_addr);
    let err = transport
        .send(b"question", Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(matches!(err, DnsError::Timeout { .. }));
}

#[tokio::test]
async fn test_framing_helpers_round_trip() {
    let (mut client, mut server) = tokio::io::duplex(1024);

    send_with_length_prefix(&mut client, b"hello frame").await.unwrap();
    let frame = read_with_length_prefix(&mut server).await.unwrap();
    assert_eq!(frame, b"hello frame");
}

#[tokio::test]
async fn test_zero_length_frame_is_rejected() {
    let (mut client, mut server) = tokio::io::duplex(16);

    client.write_all(&[0u8, 0u8]).await.unwrap();
    let err = read_with_length_prefix(&mut server).await.unwrap_err();
    assert!(matches!(err, DnsError::Protocol(_)));
}

#[tokio::test]
async fn test_short_frame_body_is_an_error() {
    let (mut client, mut server) = tokio::io::duplex(16);

    // Advertise 10 bytes, deliver 3, then close.
    client.write_all(&10u16.to_be_bytes()).await.unwrap();
    client.write_all(b"abc").await.unwrap();
    drop(client);

    let err = read_with_length_prefix(&mut server).await.unwrap_err();
    assert!(matches!(err, DnsError::Io(_)));
}

//! Listener accept loops.
//!
//! Each inbound datagram and each accepted stream connection is handed to
//! its own task so slow queries never block the accept path.

use oxidns_domain::DnsError;
use oxidns_infrastructure::dns::transport::{
    read_with_length_prefix, send_with_length_prefix, MAX_DATAGRAM_SIZE, STREAM_TIMEOUT,
};
use oxidns_infrastructure::dns::DnsServerHandler;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::{debug, error};

pub async fn run(
    udp_socket: Arc<UdpSocket>,
    tcp_listener: TcpListener,
    handler: Arc<DnsServerHandler>,
) {
    let tcp_handler = handler.clone();
    tokio::spawn(async move {
        run_tcp_listener(tcp_listener, tcp_handler).await;
    });

    run_udp_listener(udp_socket, handler).await;
}

async fn run_udp_listener(socket: Arc<UdpSocket>, handler: Arc<DnsServerHandler>) {
    let mut recv_buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (n, from) = match socket.recv_from(&mut recv_buf).await {
            Ok(x) => x,
            Err(e) => {
                error!(error = %e, "Failed to read from UDP socket");
                continue;
            }
        };

        let query = recv_buf[..n].to_vec();
        let socket = socket.clone();
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Some(response) = handler.handle_datagram(&query).await {
                if let Err(e) = socket.send_to(&response, from).await {
                    error!(to = %from, error = %e, "Failed to send UDP response");
                }
            }
        });
    }
}

async fn run_tcp_listener(listener: TcpListener, handler: Arc<DnsServerHandler>) {
    loop {
        let (stream, from) = match listener.accept().await {
            Ok(x) => x,
            Err(e) => {
                error!(error = %e, "Failed to accept TCP connection");
                continue;
            }
        };

        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_tcp_connection(stream, handler).await {
                debug!(from = %from, error = %e, "TCP connection closed with error");
            }
        });
    }
}

/// Serves one framed query/response exchange, then lets the connection
/// drop. Short reads that cannot complete inside the deadline are fatal
/// for the connection.
async fn handle_tcp_connection(
    mut stream: TcpStream,
    handler: Arc<DnsServerHandler>,
) -> Result<(), DnsError> {
    let query = tokio::time::timeout(STREAM_TIMEOUT, read_with_length_prefix(&mut stream))
        .await
        .map_err(|_| DnsError::Timeout {
            server: "stream client".to_string(),
        })??;

    if let Some(response) = handler.handle_stream(&query).await {
        tokio::time::timeout(
            STREAM_TIMEOUT,
            send_with_length_prefix(&mut stream, &response),
        )
        .await
        .map_err(|_| DnsError::Timeout {
            server: "stream client".to_string(),
        })??;
    }

    Ok(())
}

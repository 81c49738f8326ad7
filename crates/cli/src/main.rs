use anyhow::Context;
use clap::Parser;
use oxidns_application::use_cases::HandleQueryUseCase;
use oxidns_infrastructure::dns::resolver::SocketExchange;
use oxidns_infrastructure::dns::{
    DnsCacheMaintenance, DnsServerHandler, MessageCache, RecursiveResolver, UpstreamForwarder,
};
use oxidns_jobs::{CacheSweepJob, JobRunner};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, UdpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod server;

#[derive(Parser)]
#[command(name = "oxidns")]
#[command(version)]
#[command(about = "Caching iterative DNS resolver and forwarder")]
struct Cli {
    /// Upstream resolver to forward queries to (host:port)
    #[arg(long, value_name = "HOST:PORT")]
    resolver: String,

    /// Address the UDP and TCP listeners bind to
    #[arg(long, default_value = "127.0.0.1:2053", value_name = "HOST:PORT")]
    address: String,

    /// Enable the iterative resolution engine
    #[arg(long)]
    recursive: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level);

    if cli.resolver.is_empty() {
        anyhow::bail!("resolver address is required, use --resolver");
    }

    let upstream: SocketAddr = cli
        .resolver
        .parse()
        .with_context(|| format!("invalid resolver address '{}'", cli.resolver))?;
    let listen_addr: SocketAddr = cli
        .address
        .parse()
        .with_context(|| format!("invalid listener address '{}'", cli.address))?;

    info!("Starting oxidns v{}", env!("CARGO_PKG_VERSION"));

    // Bind both listeners up front so an unusable address fails the
    // process instead of a background task.
    let udp_socket = Arc::new(
        UdpSocket::bind(listen_addr)
            .await
            .with_context(|| format!("failed to bind UDP listener on {}", listen_addr))?,
    );
    let tcp_listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind TCP listener on {}", listen_addr))?;

    let cache = Arc::new(MessageCache::new());
    let forwarder = Arc::new(UpstreamForwarder::new(upstream));
    let resolver = Arc::new(RecursiveResolver::new(
        cache.clone(),
        forwarder.clone(),
        Arc::new(SocketExchange::new()),
    ));

    if cli.recursive {
        if let Err(e) = resolver.bootstrap_root_servers().await {
            error!(
                error = %e,
                "Failed to bootstrap root servers, recursive resolution may not work properly"
            );
        }
    }

    let use_case = Arc::new(HandleQueryUseCase::new(
        resolver,
        forwarder,
        cli.recursive,
    ));
    let handler = Arc::new(DnsServerHandler::new(use_case));

    let shutdown = CancellationToken::new();
    JobRunner::new()
        .with_cache_sweep(CacheSweepJob::new(Arc::new(DnsCacheMaintenance::new(
            cache.clone(),
        ))))
        .with_shutdown_token(shutdown.clone())
        .start()
        .await;

    info!(
        listener = %listen_addr,
        upstream = %upstream,
        recursive = cli.recursive,
        "DNS server ready"
    );

    server::run(udp_socket, tcp_listener, handler).await;

    shutdown.cancel();
    Ok(())
}

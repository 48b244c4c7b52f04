//! Server mode CLI logic
//!
//! Contains the core logic for running the HTTP server mode.

use std::path::PathBuf;

use crate::{
    config::ConfigLoader,
    server::{AppState, create_app},
    utils::version,
};
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Arguments for server mode
///
/// `None` leaves the configured value in place.
#[derive(Debug, Default)]
pub struct ServerArgs {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

/// Install the global tracing subscriber
///
/// `VIDPATH_LOG`, then `RUST_LOG`, take precedence over `level`; `verbose`
/// forces debug.
/// Logs go to stderr so stdout stays free for command output.
pub fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("VIDPATH_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(level))
    };

    // a second call (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run server mode with the given arguments
pub async fn run_server_mode(args: ServerArgs) -> Result<()> {
    let mut settings = ConfigLoader::new()
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Override with CLI arguments
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    settings.logging.verbose |= args.verbose;

    init_logging(settings.logging.verbose, &settings.logging.level);
    tracing::info!("Starting vidpath gateway v{}", version::get_version());

    let addr = parse_and_bind_address(&settings.server.host, settings.server.port).await?;

    let state = AppState::from_settings(settings)?;
    let guard = state.guard.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        "vidpath gateway v{} listening on {}",
        version::get_version(),
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, releasing browser session");
    guard.close().await;

    Ok(())
}

/// Resolves on SIGINT or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Parse host string and attempt to bind to the address
///
/// `::` falls back to `0.0.0.0` when the host has no IPv6 stack.
pub async fn parse_and_bind_address(host: &str, port: u16) -> Result<std::net::SocketAddr> {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

    // Try to parse as IP address first
    if let Ok(ip) = host.parse::<IpAddr>()
        && ip != IpAddr::V6(Ipv6Addr::UNSPECIFIED)
    {
        let addr = SocketAddr::new(ip, port);
        tracing::debug!("Parsed address: {}", addr);
        return Ok(addr);
    }

    match host {
        "::" => {
            let addr = SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port);

            // Test-bind the IPv6 stack; the listener is dropped right away
            match tokio::net::TcpListener::bind(addr).await {
                Ok(_) => {
                    tracing::debug!("IPv6 available, using {}", addr);
                    Ok(addr)
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not listen on [::]:{} (Caused by {}), falling back to 0.0.0.0",
                        port,
                        e
                    );
                    Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
                }
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid host address: {}. Use an IP address such as '::' or '0.0.0.0'",
                host
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[tokio::test]
    async fn test_parse_and_bind_ipv4_address() {
        let addr = parse_and_bind_address("127.0.0.1", 0).await.unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_parse_and_bind_ipv6_address() {
        let addr = parse_and_bind_address("::1", 0).await.unwrap();
        assert_eq!(addr.ip(), IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn test_parse_and_bind_ipv6_any_fallback() {
        let addr = parse_and_bind_address("::", 0).await.unwrap();
        // Should be either IPv6 unspecified or IPv4 unspecified (fallback)
        assert!(
            addr.ip() == IpAddr::V6(Ipv6Addr::UNSPECIFIED)
                || addr.ip() == IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
    }

    #[tokio::test]
    async fn test_parse_and_bind_rejects_hostnames() {
        for host in ["invalid-host", "", "localhost"] {
            let err = parse_and_bind_address(host, 8080).await.unwrap_err();
            assert!(err.to_string().contains("Invalid host address"), "{}", host);
        }
    }

    #[tokio::test]
    async fn test_run_server_mode_rejects_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let args = ServerArgs {
            config: Some(path),
            ..Default::default()
        };
        let err = run_server_mode(args).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}

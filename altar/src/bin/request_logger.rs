//! altar-request-logger - stand-in for an Awtrix device during development
//!
//! Prints every request it receives and answers 200. Point the broker at it
//! with `altar run --address 127.0.0.1 --device-port 8080 --debug`.

use std::net::SocketAddr;

use axum::Router;
use axum::body::Bytes;
use axum::extract::ConnectInfo;
use axum::http::{Method, StatusCode, Uri};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info};

const SEPARATOR: &str = "-----------------------------------";

/// Log every HTTP request received
#[derive(Parser, Debug)]
#[command(name = "altar-request-logger", version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

fn format_request(method: &Method, uri: &Uri, remote: SocketAddr, body: &[u8]) -> String {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let body = if body.is_empty() {
        "<empty>".to_string()
    } else {
        String::from_utf8_lossy(body).into_owned()
    };
    format!("[{timestamp}] {method} {uri} from {remote}\nBody: {body}\n{SEPARATOR}")
}

async fn log_request(
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, &'static str) {
    debug!(%method, %uri, "log_request: called");
    println!("{}", format_request(&method, &uri, remote, &body));
    (StatusCode::OK, "Request logged successfully")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind request logger to {addr}"))?;

    info!(%addr, "Starting request logger, press Ctrl+C to stop");
    let app = Router::new().fallback(log_request);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Request logger failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> SocketAddr {
        "10.0.0.5:51234".parse().unwrap()
    }

    #[test]
    fn test_format_request_with_body() {
        let uri: Uri = "/api/custom?name=hello".parse().unwrap();
        let record = format_request(&Method::POST, &uri, remote(), br#"{"text":"hi"}"#);

        assert!(record.starts_with('['));
        assert!(record.contains("] POST /api/custom?name=hello from 10.0.0.5:51234\n"));
        assert!(record.contains(r#"Body: {"text":"hi"}"#));
        assert!(record.ends_with(SEPARATOR));
    }

    #[test]
    fn test_format_request_empty_body() {
        let uri: Uri = "/api/reboot".parse().unwrap();
        let record = format_request(&Method::POST, &uri, remote(), b"");
        assert!(record.contains("Body: <empty>"));
    }

    #[test]
    fn test_args_default_port() {
        let args = Args::parse_from(["altar-request-logger"]);
        assert_eq!(args.port, 8080);

        let args = Args::parse_from(["altar-request-logger", "--port", "9090"]);
        assert_eq!(args.port, 9090);
    }
}

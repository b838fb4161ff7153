use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use prometheus::Registry;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::health::{live_check_body, ready_check_body};
use super::metrics_handler::render_metrics;

/// Minimal observability server: `/metrics` (Prometheus text
/// exposition), `/health`, `/ready`, `/live`. No web framework - this
/// crate's dependency stack dropped `hyper` once the proxy's HTTP
/// forwarding path did (see DESIGN.md); a handful of fixed routes over
/// raw HTTP/1.1 needs nothing more than a line reader and a
/// `TcpListener`.
pub async fn start_observability_server(
    addr: SocketAddr,
    registry: Registry,
    attached: Arc<AtomicBool>,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "observability server started (metrics + health checks)");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "observability server: accept error");
                continue;
            }
        };
        let registry = registry.clone();
        let attached = attached.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_one(stream, &registry, &attached).await {
                warn!(%peer, error = %e, "observability server: connection error");
            }
        });
    }
}

async fn serve_one(
    stream: tokio::net::TcpStream,
    registry: &Registry,
    attached: &AtomicBool,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");

    let (status, content_type, body) = match path {
        "/metrics" => match render_metrics(registry) {
            Ok((body, content_type)) => (200, content_type, body),
            Err(_) => (500, "text/plain".to_string(), "internal error".to_string()),
        },
        "/health" => (200, "application/json".to_string(), live_check_body()),
        "/live" => (200, "application/json".to_string(), live_check_body()),
        "/ready" => {
            let (status, body) = ready_check_body(attached.load(Ordering::Relaxed));
            (status, "application/json".to_string(), body)
        }
        _ => (404, "text/plain".to_string(), "not found".to_string()),
    };

    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        503 => "Service Unavailable",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    write_half.write_all(response.as_bytes()).await?;
    write_half.shutdown().await?;
    Ok(())
}

// ABOUTME: Minimal HTTP/1.1 readiness probe client.
// ABOUTME: A 2xx response on GET <path> means healthy.

use super::ProbeOutcome;
use http_body_util::Empty;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

/// Issue a single GET against `host:port` and classify the response.
///
/// Connection-level failures are `Unreachable`; a non-2xx status is
/// `Unhealthy`. The caller bounds the whole call with its probe timeout.
pub async fn http_probe(host: &str, port: u16, path: &str) -> ProbeOutcome {
    let stream = match TcpStream::connect((host, port)).await {
        Ok(s) => s,
        Err(e) => return ProbeOutcome::Unreachable(format!("connect {host}:{port}: {e}")),
    };

    let io = TokioIo::new(stream);
    let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
        Ok(pair) => pair,
        Err(e) => return ProbeOutcome::Unreachable(format!("handshake: {e}")),
    };

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("probe connection error: {}", e);
        }
    });

    let req = match hyper::Request::builder()
        .method("GET")
        .uri(path)
        .header("Host", host)
        .body(Empty::<bytes::Bytes>::new())
    {
        Ok(r) => r,
        Err(e) => return ProbeOutcome::Unreachable(format!("build request: {e}")),
    };

    match sender.send_request(req).await {
        Ok(resp) if resp.status().is_success() => ProbeOutcome::Healthy,
        Ok(resp) => ProbeOutcome::Unhealthy(format!("status {}", resp.status())),
        Err(e) => ProbeOutcome::Unreachable(format!("request: {e}")),
    }
}

//! The per-connection forwarding state machine (C5): read the client's
//! request, consult the cache, on miss contact the origin, stream its
//! response back to the client while capturing it for possible admission.

use crate::cache::MAX_OBJECT_SIZE;
use crate::coordinator::CacheCoordinator;
use crate::error::ProxyError;
use crate::headers::build_request;
use crate::uri::parse_uri;
use bytes::BytesMut;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Bound on a single client/origin read or write so a stalled peer cannot
/// leak a worker forever. Additive to the core spec (§5).
const IO_TIMEOUT: Duration = Duration::from_secs(30);
const READ_CHUNK: usize = 8 * 1024;
/// Bound on the size of the request line + headers read from the client,
/// so a client that never sends a blank line cannot exhaust memory.
const MAX_REQUEST_HEADER_BYTES: usize = 64 * 1024;

/// Outcome of reading and parsing a client request. `ConnectionClosed`
/// covers the cases where nothing should be sent back (the peer never
/// sent a byte, or went away/timed out mid-read); `Malformed` covers a
/// request that arrived but doesn't parse as `METHOD SP URI SP VERSION`.
enum ReadOutcome {
    Parsed { method: String, uri: String, headers: Vec<String> },
    ConnectionClosed,
    Malformed,
}

/// Drives one accepted connection through READ_REQUEST → CACHE_LOOKUP →
/// PARSE_URI → CONNECT_ORIGIN → FORWARD_REQUEST → STREAM_RESPONSE →
/// MAYBE_ADMIT, per §4.5. Every exit path releases the client socket.
pub async fn handle_connection(mut client: TcpStream, cache: Arc<CacheCoordinator>) {
    let (method, uri, headers) = match read_request(&mut client).await {
        ReadOutcome::Parsed { method, uri, headers } => (method, uri, headers),
        ReadOutcome::ConnectionClosed => return,
        ReadOutcome::Malformed => {
            let err = ProxyError::MalformedRequest;
            debug!("Rejecting malformed request: {}", err);
            let _ = send_error(&mut client, &err).await;
            return;
        }
    };

    if !method.eq_ignore_ascii_case("GET") {
        let err = ProxyError::UnsupportedMethod(method);
        debug!("Rejecting unsupported method: {}", err);
        let _ = send_error(&mut client, &err).await;
        return;
    }

    if let Some(object) = cache.read_try(&uri).await {
        debug!("CACHE HIT: {}", uri);
        let _ = client.write_all(&object).await;
        return;
    }
    debug!("CACHE MISS: {}", uri);

    let parsed = match parse_uri(&uri) {
        Some(p) => p,
        None => {
            let err = ProxyError::UriUnparseable(uri.clone());
            debug!("Rejecting unparseable uri: {}", err);
            let _ = send_error(&mut client, &err).await;
            return;
        }
    };

    let port: u16 = match parsed.port.parse() {
        Ok(p) => p,
        Err(_) => {
            warn!("Origin port unparseable: {}", parsed.port);
            return;
        }
    };

    let origin = match timeout(IO_TIMEOUT, TcpStream::connect((parsed.host.as_str(), port))).await
    {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            let err = ProxyError::OriginUnreachable(e);
            warn!("Origin {}:{} unreachable: {}", parsed.host, port, err);
            return;
        }
        Err(_) => {
            warn!("Origin {}:{} connect timed out", parsed.host, port);
            return;
        }
    };

    let request_bytes = build_request(&parsed.host, &parsed.path, &headers);
    let (mut origin_read, mut origin_write) = origin.into_split();

    match timeout(IO_TIMEOUT, origin_write.write_all(&request_bytes)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            let err = ProxyError::PeerIoError(e);
            debug!("Failed to forward request to origin: {}", err);
            return;
        }
        Err(_) => {
            debug!("Timed out forwarding request to origin");
            return;
        }
    }

    let mut capture = BytesMut::with_capacity(MAX_OBJECT_SIZE);
    let mut overflow = false;
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match timeout(IO_TIMEOUT, origin_read.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                let err = ProxyError::PeerIoError(e);
                debug!("Origin read failed mid-stream: {}", err);
                overflow = true;
                break;
            }
            Err(_) => {
                debug!("Origin read timed out mid-stream");
                overflow = true;
                break;
            }
        };

        if client.write_all(&chunk[..n]).await.is_err() {
            // Peer closed during write; nothing more to do for this worker.
            return;
        }

        if !overflow {
            if capture.len() + n <= MAX_OBJECT_SIZE {
                capture.extend_from_slice(&chunk[..n]);
            } else {
                overflow = true;
            }
        }
    }

    if !overflow {
        cache.write_admit(uri, capture.freeze()).await;
    } else {
        debug!("Response not admitted for {}: {}", uri, ProxyError::OversizeResponse);
    }
}

/// Reads from `client` until a complete request line + headers (terminated
/// by a blank line) have arrived, then parses them with `httparse`, the
/// same library and pattern the reference proxy uses for its own request
/// parsing.
async fn read_request(client: &mut TcpStream) -> ReadOutcome {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        match timeout(IO_TIMEOUT, client.read_buf(&mut buf)).await {
            Ok(Ok(0)) => {
                return if buf.is_empty() {
                    ReadOutcome::ConnectionClosed
                } else {
                    // Peer closed mid-request: what arrived never reached a
                    // blank line, so treat it the same as a parse failure.
                    ReadOutcome::Malformed
                };
            }
            Ok(Ok(_)) => {}
            Ok(Err(_)) | Err(_) => return ReadOutcome::ConnectionClosed,
        }

        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buf.len() > MAX_REQUEST_HEADER_BYTES {
            return ReadOutcome::Malformed;
        }
    }

    match parse_request(&buf) {
        Some((method, uri, headers)) => ReadOutcome::Parsed { method, uri, headers },
        None => ReadOutcome::Malformed,
    }
}

fn parse_request(data: &[u8]) -> Option<(String, String, Vec<String>)> {
    let mut header_slots = [httparse::EMPTY_HEADER; 64];
    let mut request = httparse::Request::new(&mut header_slots);

    match request.parse(data) {
        Ok(httparse::Status::Complete(_)) => {
            let method = request.method?.to_string();
            let uri = request.path?.to_string();
            let headers: Vec<String> = request
                .headers
                .iter()
                .map(|h| format!("{}: {}", h.name, String::from_utf8_lossy(h.value)))
                .collect();
            Some((method, uri, headers))
        }
        _ => None,
    }
}

async fn send_error<W>(writer: &mut W, err: &ProxyError) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let (code, short) = err.client_status().unwrap_or(("500", "Internal Server Error"));
    let long = err.long_message();
    let cause = err.cause();

    let body = format!(
        "<html><title>proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {code}: {short}\r\n\
         <p>{long}: {cause}\r\n\
         <hr><em>The Proxy server</em>\r\n"
    );

    let mut response = format!("HTTP/1.0 {code} {short}\r\n");
    response.push_str("Content-type: text/html\r\n");
    response.push_str(&format!("Content-length: {}\r\n\r\n", body.len()));
    response.push_str(&body);

    writer.write_all(response.as_bytes()).await
}

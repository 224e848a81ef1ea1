//! Builds the origin-bound HTTP/1.0 request: fixed headers injected, a
//! blacklist of client headers suppressed in favor of those fixed values,
//! everything else passed through verbatim.

pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:3.10.0) Gecko/20181101 Firefox/61.0.1";

/// Header name substrings (case-insensitive) that are never forwarded from
/// the client: the proxy always sends its own values for these instead.
const BLACKLIST: [&str; 3] = ["user-agent", "connection", "proxy-connection"];

/// Returns true if `header_line` (e.g. `"Accept-Language: en-us\r\n"`)
/// should be suppressed because it collides with a fixed header the proxy
/// injects itself (§4.2, B3).
fn is_blacklisted(header_line: &str) -> bool {
    let lower = header_line.to_lowercase();
    BLACKLIST.iter().any(|name| lower.contains(name))
}

/// Builds the exact byte stream to send to the origin for a GET request to
/// `path` on `host`, passing through `client_headers` minus the blacklist.
///
/// `client_headers` entries are bare lines without their own CRLF.
pub fn build_request(host: &str, path: &str, client_headers: &[String]) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!("GET {path} HTTP/1.0\r\n"));
    out.push_str(&format!("Host: {host}\r\n"));
    out.push_str(&format!("User-Agent: {USER_AGENT}\r\n"));
    out.push_str("Connection: close\r\n");
    out.push_str("Proxy-Connection: close\r\n");

    for header in client_headers {
        if !is_blacklisted(header) {
            out.push_str(header);
            out.push_str("\r\n");
        }
    }

    out.push_str("\r\n");
    out.into_bytes()
}

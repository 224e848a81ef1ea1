//! Splits an absolute `http://` URI as received from a browser client into
//! the `(host, port, path)` triple the forwarding engine needs to contact
//! the origin, per the accepted form `http://<host>[:<port>]<path-or-empty>`.

/// Result of a successful parse: borrowed-free, owned pieces ready to build
/// an origin connection and an origin-bound request line from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri {
    pub host: String,
    pub port: String,
    pub path: String,
}

/// Parses `uri` into host/port/path, or `None` if it is not recognizably an
/// absolute `http://` URI.
///
/// The `http://` prefix is located with a scan rather than required to be
/// at position zero, matching the permissive behavior of the reference
/// implementation this component is grounded on.
pub fn parse_uri(uri: &str) -> Option<ParsedUri> {
    let prefix_pos = uri.find("http://")?;
    let rest = &uri[prefix_pos + "http://".len()..];

    let delim = rest.find(['/', ':']);
    let (host, after_host) = match delim {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    if host.is_empty() {
        return None;
    }

    let (port, path_part) = if let Some(stripped) = after_host.strip_prefix(':') {
        let slash = stripped.find('/').unwrap_or(stripped.len());
        (stripped[..slash].to_string(), &stripped[slash..])
    } else {
        ("80".to_string(), after_host)
    };

    let path = if path_part.is_empty() || path_part == "/" {
        "/index.html".to_string()
    } else {
        path_part.to_string()
    };

    Some(ParsedUri {
        host: host.to_string(),
        port,
        path,
    })
}

use std::fmt;

/// Error kinds the forwarding engine can observe while handling one connection.
///
/// Each variant corresponds to one of the error kinds named in the proxy's
/// propagation policy: the first three are reported to the client as a
/// synthesized HTTP response, the rest are logged and swallowed.
#[derive(Debug)]
pub enum ProxyError {
    MalformedRequest,
    UnsupportedMethod(String),
    UriUnparseable(String),
    OriginUnreachable(std::io::Error),
    PeerIoError(std::io::Error),
    OversizeResponse,
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::MalformedRequest => write!(f, "malformed request line"),
            ProxyError::UnsupportedMethod(m) => write!(f, "unsupported method: {m}"),
            ProxyError::UriUnparseable(uri) => write!(f, "could not parse uri: {uri}"),
            ProxyError::OriginUnreachable(e) => write!(f, "origin unreachable: {e}"),
            ProxyError::PeerIoError(e) => write!(f, "peer i/o error: {e}"),
            ProxyError::OversizeResponse => write!(f, "response exceeds max object size"),
        }
    }
}

impl std::error::Error for ProxyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProxyError::OriginUnreachable(e) | ProxyError::PeerIoError(e) => Some(e),
            _ => None,
        }
    }
}

/// The canonical (code, short-message) pair used to build a synthesized
/// client-visible error response. Only client-reportable kinds have one.
impl ProxyError {
    pub fn client_status(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ProxyError::MalformedRequest | ProxyError::UriUnparseable(_) => {
                Some(("400", "Bad request"))
            }
            ProxyError::UnsupportedMethod(_) => Some(("501", "Not Implemented")),
            _ => None,
        }
    }

    pub fn long_message(&self) -> &'static str {
        match self {
            ProxyError::MalformedRequest | ProxyError::UriUnparseable(_) => {
                "request could not be understood by the proxy"
            }
            ProxyError::UnsupportedMethod(_) => "proxy server does not implement this method",
            _ => "",
        }
    }

    pub fn cause(&self) -> String {
        match self {
            ProxyError::MalformedRequest => String::new(),
            ProxyError::UnsupportedMethod(m) => m.clone(),
            ProxyError::UriUnparseable(uri) => uri.clone(),
            _ => String::new(),
        }
    }
}

//! Core of a concurrent HTTP/1.0 forward proxy with a shared, bounded,
//! LRU-evicting web-object cache behind a reader-preference coordinator.
//!
//! Module layout mirrors the component breakdown of the design document:
//! [`uri`] (C1), [`headers`] (C2), [`cache`] (C3), [`coordinator`] (C4),
//! [`forward`] (C5), [`config`] (C8), plus the shared [`error`] model
//! (C7). The acceptor (C6) lives in `main.rs` since it owns the process's
//! runtime and signal handling.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod forward;
pub mod headers;
pub mod uri;

pub use cache::{CacheStore, MAX_CACHE_SIZE, MAX_OBJECT_SIZE};
pub use config::ProxyConfig;
pub use coordinator::CacheCoordinator;
pub use error::ProxyError;
pub use forward::handle_connection;
pub use headers::{build_request, USER_AGENT};
pub use uri::{parse_uri, ParsedUri};

pub mod round_robin;
pub mod single;
pub mod types;

use crate::config::Config;
use anyhow::Result;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::{ProtoError, ProtoErrorKind};
use hickory_resolver::{ResolveError, ResolveErrorKind};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub use self::round_robin::ResolverPool;
pub use self::single::SingleResolver;
pub use self::types::{HostLookup, LookupFailure, LookupResult, Verdict};

/// Builds the round-robin pool from the configured resolver addresses.
///
/// Entries that do not parse are logged and skipped; the pool fails only
/// when nothing usable is left.
pub fn create_pool(config: &Config) -> Result<ResolverPool> {
    let timeout = Duration::from_millis(config.dial_timeout_ms);
    let mut endpoints: Vec<Arc<dyn HostLookup>> = Vec::new();

    for (idx, entry) in config.resolvers.iter().enumerate() {
        match parse_endpoint(entry) {
            Some(addr) => {
                info!("Added resolver: [{}] {}", idx, addr);
                endpoints.push(Arc::new(SingleResolver::new(addr, timeout)));
            }
            None => {
                error!("Ignoring unparseable resolver address '{}'", entry);
            }
        }
    }

    if endpoints.is_empty() {
        return Err(anyhow::anyhow!("No valid resolvers available"));
    }
    ResolverPool::new(endpoints)
}

/// Accepts `ip:port`, `[v6]:port`, or a bare IP (port 53).
pub fn parse_endpoint(entry: &str) -> Option<SocketAddr> {
    let entry = entry.trim();
    if let Ok(addr) = entry.parse::<SocketAddr>() {
        return Some(addr);
    }
    entry
        .parse::<IpAddr>()
        .ok()
        .map(|ip| SocketAddr::new(ip, 53))
}

/// Maps a hickory error onto the run's failure classes.
pub fn classify(err: &ResolveError) -> LookupFailure {
    match err.kind() {
        ResolveErrorKind::Proto(proto) => classify_proto(proto),
        _ => LookupFailure::Other(err.to_string()),
    }
}

fn classify_proto(proto: &ProtoError) -> LookupFailure {
    match proto.kind() {
        ProtoErrorKind::Timeout => LookupFailure::Timeout,
        ProtoErrorKind::NoRecordsFound { response_code, .. } => match *response_code {
            // The server could not answer; says nothing about the name
            ResponseCode::ServFail | ResponseCode::Refused => {
                LookupFailure::Temporary(proto.to_string())
            }
            _ => LookupFailure::NotFound,
        },
        ProtoErrorKind::Io(_) | ProtoErrorKind::Busy | ProtoErrorKind::NoConnections => {
            LookupFailure::Temporary(proto.to_string())
        }
        _ => LookupFailure::Other(proto.to_string()),
    }
}

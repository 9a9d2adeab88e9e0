use super::classify;
use super::types::{HostLookup, LookupResult};
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

/// One DNS server, queried over UDP with TCP fallback.
pub struct SingleResolver {
    addr: SocketAddr,
    resolver: TokioResolver,
}

impl SingleResolver {
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        let mut resolver_config = ResolverConfig::new();
        resolver_config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));
        resolver_config.add_name_server(NameServerConfig::new(addr, Protocol::Tcp));

        let resolver =
            Resolver::builder_with_config(resolver_config, TokioConnectionProvider::default())
                .with_options(resolver_opts(timeout))
                .build();

        Self { addr, resolver }
    }
}

/// One query per name, bounded by `timeout`.
fn resolver_opts(timeout: Duration) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.cache_size = 0; // every host is asked exactly once per run
    opts.timeout = timeout;
    opts.attempts = 1;
    opts
}

#[async_trait::async_trait]
impl HostLookup for SingleResolver {
    async fn lookup_host(&self, host: &str) -> LookupResult {
        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(e) => {
                debug!(resolver = %self.addr, host, error = %e, "lookup failed");
                Err(classify(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_attempt_within_timeout() {
        let opts = resolver_opts(Duration::from_millis(1500));
        assert_eq!(opts.attempts, 1);
        assert_eq!(opts.cache_size, 0);
        assert_eq!(opts.timeout, Duration::from_millis(1500));
    }
}

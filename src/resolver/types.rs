use std::net::IpAddr;
use thiserror::Error;

/// Why a host lookup produced no addresses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupFailure {
    #[error("lookup timed out")]
    Timeout,
    #[error("no such host")]
    NotFound,
    #[error("temporary failure: {0}")]
    Temporary(String),
    #[error("lookup failed: {0}")]
    Other(String),
}

pub type LookupResult = std::result::Result<Vec<IpAddr>, LookupFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid,
}

impl Verdict {
    /// Only a timeout or a definite "does not exist" removes a host.
    /// Temporary and unclassified errors keep it.
    pub fn of(result: &LookupResult) -> Self {
        match result {
            Err(LookupFailure::Timeout) | Err(LookupFailure::NotFound) => Verdict::Invalid,
            Err(LookupFailure::Temporary(_)) | Err(LookupFailure::Other(_)) | Ok(_) => {
                Verdict::Valid
            }
        }
    }
}

/// Host-existence lookup, implemented by single endpoints and by the pool.
#[async_trait::async_trait]
pub trait HostLookup: Send + Sync {
    async fn lookup_host(&self, host: &str) -> LookupResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_table() {
        assert_eq!(Verdict::of(&Err(LookupFailure::Timeout)), Verdict::Invalid);
        assert_eq!(Verdict::of(&Err(LookupFailure::NotFound)), Verdict::Invalid);
        assert_eq!(
            Verdict::of(&Err(LookupFailure::Temporary("servfail".into()))),
            Verdict::Valid
        );
        assert_eq!(
            Verdict::of(&Err(LookupFailure::Other("weird".into()))),
            Verdict::Valid
        );
        assert_eq!(
            Verdict::of(&Ok(vec!["1.2.3.4".parse().unwrap()])),
            Verdict::Valid
        );
        // An empty success is still a success
        assert_eq!(Verdict::of(&Ok(vec![])), Verdict::Valid);
    }
}

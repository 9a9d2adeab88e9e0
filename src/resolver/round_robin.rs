use super::types::{HostLookup, LookupResult};
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Hands lookups to a fixed set of endpoints in rotation.
///
/// The cursor is read and advanced under the lock, but the lookup itself
/// runs unlocked, so two concurrent callers may land on the same endpoint
/// when the cursor has not moved yet. Rotation only spreads load.
pub struct ResolverPool {
    endpoints: Vec<Arc<dyn HostLookup>>,
    cursor: Mutex<usize>,
}

impl ResolverPool {
    pub fn new(endpoints: Vec<Arc<dyn HostLookup>>) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(anyhow::anyhow!("Resolver pool needs at least one endpoint"));
        }
        Ok(Self {
            endpoints,
            cursor: Mutex::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub async fn resolve(&self, host: &str) -> LookupResult {
        let idx = *self.cursor.lock();

        let result = self.endpoints[idx].lookup_host(host).await;

        let mut cursor = self.cursor.lock();
        *cursor = (*cursor + 1) % self.endpoints.len();
        result
    }
}

#[async_trait::async_trait]
impl HostLookup for ResolverPool {
    async fn lookup_host(&self, host: &str) -> LookupResult {
        self.resolve(host).await
    }
}

//! Infrastructure adapter implementing `CacheMaintenancePort`.

use crate::dns::cache::MessageCache;
use async_trait::async_trait;
use oxidns_application::ports::{CacheMaintenancePort, SweepOutcome};
use oxidns_domain::DnsError;
use std::sync::Arc;

pub struct DnsCacheMaintenance {
    cache: Arc<MessageCache>,
}

impl DnsCacheMaintenance {
    pub fn new(cache: Arc<MessageCache>) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl CacheMaintenancePort for DnsCacheMaintenance {
    async fn run_sweep_cycle(&self) -> Result<SweepOutcome, DnsError> {
        let entries_removed = self.cache.sweep();
        Ok(SweepOutcome {
            entries_removed,
            cache_size: self.cache.len(),
        })
    }
}

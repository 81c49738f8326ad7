use async_trait::async_trait;
use oxidns_domain::DnsError;

/// Outcome of a cache sweep cycle.
#[derive(Debug, Default, Clone)]
pub struct SweepOutcome {
    pub entries_removed: usize,
    pub cache_size: usize,
}

/// Port for periodic cache maintenance.
#[async_trait]
pub trait CacheMaintenancePort: Send + Sync {
    /// Drops entries whose expiry is in the past.
    async fn run_sweep_cycle(&self) -> Result<SweepOutcome, DnsError>;
}

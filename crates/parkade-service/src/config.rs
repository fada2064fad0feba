//! Service configuration.

use parkade_core::query::DEFAULT_RECENT_CHECKOUTS;

/// Configuration for the occupancy coordinator.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Number of check-outs returned by `recent_checkouts` (default: 10).
    pub recent_checkout_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            recent_checkout_limit: DEFAULT_RECENT_CHECKOUTS,
        }
    }
}

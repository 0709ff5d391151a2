//! Root configuration (`§2.1`), aggregating each subsystem's own
//! `Configuration` struct, mirroring the teacher's `core/src/config.rs`
//! composition of per-module configuration blocks.

use serde::{Deserialize, Serialize};

use crate::{ledger::LedgerConfiguration, queue::QueueConfiguration};

/// The node's full configuration: one field per subsystem, each with its
/// own `#[serde(default)]`-friendly `Default` impl.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Storage coordinator / block store configuration.
    pub ledger: LedgerConfiguration,
    /// Ordering service configuration.
    pub queue: QueueConfiguration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_json() {
        let config = Configuration::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: Configuration = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.queue.max_size, config.queue.max_size);
    }
}

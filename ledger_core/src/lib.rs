//! Ledger core: the ordering service, world-state view, block store,
//! query index and command executor of a permissioned distributed
//! ledger node, plus the configuration, logging and key-management
//! surface a deployable node needs around them.

pub mod config;
pub mod data_model;
pub mod keys_manager;
pub mod kura;
pub mod ledger;
pub mod logging;
pub mod query;
pub mod queue;
pub mod smartcontracts;
pub mod state;
pub mod wsv;

pub use ledger::{BlockValidator, Ledger, MutableStorage};

/// Re-exports the types most call sites need, mirroring the teacher's
/// top-level `prelude` convention.
pub mod prelude {
    pub use crate::{
        config::Configuration,
        data_model::prelude::*,
        keys_manager::KeysManager,
        kura::{BlockStore, KuraConfiguration},
        ledger::{BlockValidator, Ledger, LedgerConfiguration, MutableStorage},
        query::QueryIndex,
        queue::{OrderingService, OrderingServiceTransport, PeerQuery, Queue, QueueConfiguration},
        smartcontracts::{CmdError, Execute},
        state::{State, StateBlock, StateTransaction},
        wsv::{World, WorldStateView, WorldTables},
    };
}

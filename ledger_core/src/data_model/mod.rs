//! Plain-data types shared by every component: the entities of `§3`
//! (accounts, domains, assets, peers), the command set executed by
//! [`crate::smartcontracts`], and the transaction/block/proposal envelopes
//! that travel between the ordering service, the mutable storage and the
//! block store.

pub mod account;
pub mod asset;
pub mod block;
pub mod domain;
pub mod peer;
pub mod transaction;

/// Re-exports the types most call sites need, mirroring the teacher's
/// `prelude` convention used throughout `core/src`.
pub mod prelude {
    pub use super::{
        account::{Account, AccountId},
        asset::{AssetDefinition, AssetId, Quantity},
        block::{Block, BlockHeader, Proposal},
        domain::{Domain, DomainId},
        peer::Peer,
        transaction::{Command, Transaction, TransactionPayload},
    };
}

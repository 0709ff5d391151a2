//! Exhaustive dispatch over [`Command`], grounded on the teacher's
//! `impl Execute for InstructionBox` in `core/src/smartcontracts/isi/mod.rs`:
//! one `Execute` trait, one match arm per variant, delegating to a
//! per-entity-kind module.

pub mod account;
pub mod asset;
pub mod domain;
pub mod peer;

use crate::{data_model::prelude::*, state::StateTransaction};

/// Errors a command can reject with (`§7`'s `CmdError` kind).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub enum CmdError {
    /// {0} not found
    Missing(String),
    /// {0} already exists
    Duplicate(String),
    /// insufficient funds: balance {balance} is less than {amount}
    InsufficientFunds { balance: Quantity, amount: Quantity },
    /// precision mismatch: expected {expected}, got {got}
    PrecisionMismatch { expected: u8, got: u8 },
    /// amount must be strictly positive
    BadAmount,
    /// quorum violation: {0}
    QuorumViolation(String),
    /// permission denied
    PermissionDenied,
}

/// A pure function `(command, view) -> Result<(), CmdError>`; side effects
/// stage into the [`StateTransaction`] and are never observed outside it
/// unless the transaction is kept (`§4.5`).
pub trait Execute {
    /// Executes `self` against `tx`, staging any mutations.
    ///
    /// # Errors
    /// A [`CmdError`] describing why the command was rejected.
    fn execute(&self, tx: &mut StateTransaction<'_>) -> Result<(), CmdError>;
}

impl Execute for Command {
    fn execute(&self, tx: &mut StateTransaction<'_>) -> Result<(), CmdError> {
        match self {
            Command::CreateDomain { name } => domain::create_domain(tx, name),
            Command::CreateAccount {
                name,
                domain,
                public_key,
            } => account::create_account(tx, name, domain, *public_key),
            Command::CreateAsset {
                name,
                domain,
                precision,
            } => asset::create_asset(tx, name, domain, *precision),
            Command::AddAssetQuantity {
                account_id,
                asset_id,
                amount,
            } => asset::add_asset_quantity(tx, account_id, asset_id, *amount),
            Command::TransferAsset {
                src_account_id,
                dest_account_id,
                asset_id,
                amount,
                ..
            } => asset::transfer_asset(tx, src_account_id, dest_account_id, asset_id, *amount),
            Command::AddSignatory {
                account_id,
                public_key,
            } => account::add_signatory(tx, account_id, *public_key),
            Command::RemoveSignatory {
                account_id,
                public_key,
            } => account::remove_signatory(tx, account_id, *public_key),
            Command::SetQuorum { account_id, quorum } => account::set_quorum(tx, account_id, *quorum),
            Command::AddPeer { public_key, address } => peer::add_peer(tx, *public_key, address),
        }
    }
}

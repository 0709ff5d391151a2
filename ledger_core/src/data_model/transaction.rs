//! Commands (the ledger's instruction set) and the transactions that
//! bundle them.

use ledger_crypto::{hash_of, HashOf, PublicKey};
use serde::{Deserialize, Serialize};

use super::{account::AccountId, asset::AssetId, asset::Quantity};

/// One instruction executed against the world-state view. A transaction is
/// an ordered list of these; `§4.5` gives the full semantics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Registers a new, empty domain.
    CreateDomain {
        /// Name of the domain to create.
        name: String,
    },
    /// Registers a new account in an existing domain.
    CreateAccount {
        /// Account name, unique within `domain`.
        name: String,
        /// Domain the account is created in.
        domain: String,
        /// Initial signatory, or [`PublicKey::ZERO`] for none.
        public_key: PublicKey,
    },
    /// Registers a new asset definition in an existing domain.
    CreateAsset {
        /// Asset name, unique within `domain`.
        name: String,
        /// Domain the asset is created in.
        domain: String,
        /// Number of decimal digits after the point (`<= 255`).
        precision: u8,
    },
    /// Mints `amount` of `asset_id` into `account_id`'s balance.
    AddAssetQuantity {
        /// Account receiving the minted quantity.
        account_id: AccountId,
        /// Asset being minted.
        asset_id: AssetId,
        /// Amount to mint; must be strictly positive.
        amount: Quantity,
    },
    /// Moves `amount` of `asset_id` from `src_account_id` to
    /// `dest_account_id`.
    TransferAsset {
        /// Source account, debited.
        src_account_id: AccountId,
        /// Destination account, credited.
        dest_account_id: AccountId,
        /// Asset being transferred.
        asset_id: AssetId,
        /// Amount to transfer; must be strictly positive.
        amount: Quantity,
        /// Free-form note, not interpreted by the executor.
        description: String,
    },
    /// Adds a signatory to an account.
    AddSignatory {
        /// Account to modify.
        account_id: AccountId,
        /// Key to add.
        public_key: PublicKey,
    },
    /// Removes a signatory from an account.
    RemoveSignatory {
        /// Account to modify.
        account_id: AccountId,
        /// Key to remove.
        public_key: PublicKey,
    },
    /// Sets an account's signature quorum.
    SetQuorum {
        /// Account to modify.
        account_id: AccountId,
        /// New quorum; must be in `1..=signatories.len()`.
        quorum: u32,
    },
    /// Registers a new peer.
    AddPeer {
        /// The peer's public key.
        public_key: PublicKey,
        /// The peer's transport address.
        address: String,
    },
}

/// The hashed, immutable body of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// The account proposing this transaction.
    pub creator: AccountId,
    /// Milliseconds since the Unix epoch when this transaction was built.
    pub created_at_ms: u64,
    /// Monotonic counter scoped to `creator`, used to deduplicate retries.
    pub creator_tx_counter: u64,
    /// The commands to execute, in order.
    pub commands: Vec<Command>,
}

/// A transaction: a hashed payload plus the hash itself, computed once at
/// construction and carried alongside (never recomputed from a possibly
/// stale payload).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The transaction's immutable body.
    pub payload: TransactionPayload,
    /// `hash_of(&payload)`, computed once at construction time.
    hash: HashOf<Transaction>,
}

impl Transaction {
    /// Builds a transaction and computes its hash over `payload`.
    ///
    /// # Panics
    /// Panics only if `payload` cannot be serialized, which cannot happen
    /// for this crate's plain-data command set.
    #[must_use]
    pub fn new(payload: TransactionPayload) -> Self {
        let hash = hash_of(&payload).expect("transaction payload is always serializable");
        Self { payload, hash }
    }

    /// This transaction's hash.
    #[must_use]
    pub fn hash(&self) -> HashOf<Transaction> {
        self.hash
    }
}

//! Blocks (committed, hash-chained) and proposals (ordered, not yet
//! committed).

use ledger_crypto::{hash_of, Hash, HashOf};
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;

/// The hashed part of a block: everything except the block's own
/// `hash` field (invariant 4 of `§3`: `hash = H(block body without hash)`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Dense, strictly increasing from 1.
    pub height: u64,
    /// `hash` of the block at `height - 1`, or [`Hash::ZERO`] at height 1.
    pub prev_hash: Hash,
    /// Root of a hash tree over `transactions` (here: a hash of the
    /// ordered transaction hashes, not a full Merkle proof structure,
    /// since no component needs inclusion proofs).
    pub merkle_root: Hash,
    /// Milliseconds since the Unix epoch when this block was assembled.
    pub created_ts: u64,
    /// Number of transactions that were accepted into `transactions`
    /// (excludes `rejected_transactions`).
    pub txs_number: u64,
}

/// A consensus-ordered, durably stored group of transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// This block's header.
    pub header: BlockHeader,
    /// Transactions that were applied to the world-state view.
    pub transactions: Vec<Transaction>,
    /// Transactions that were included in the candidate block but whose
    /// commands failed and were rolled back (`§4.5`); kept for audit, never
    /// indexed by the query index.
    pub rejected_transactions: Vec<Transaction>,
}

impl Block {
    /// Computes this block's hash over its header and transactions,
    /// excluding the hash itself (there is no `hash` field on [`Block`];
    /// callers that need the hash call this and wrap it in a [`HashOf`]).
    ///
    /// # Panics
    /// Panics only if the block cannot be serialized, which cannot happen
    /// for this crate's plain-data types.
    #[must_use]
    pub fn hash(&self) -> HashOf<Block> {
        hash_of(&(&self.header, &self.transactions, &self.rejected_transactions))
            .expect("block is always serializable")
    }

    /// Computes the `merkle_root` field for a candidate set of applied
    /// transactions: the hash of the ordered list of their hashes.
    #[must_use]
    pub fn merkle_root_of(transactions: &[Transaction]) -> Hash {
        let hashes: Vec<_> = transactions.iter().map(Transaction::hash).collect();
        hash_of(&hashes)
            .expect("transaction hash list is always serializable")
            .into_hash()
    }
}

/// An ordered batch of transactions emitted by the ordering service,
/// awaiting consensus ordering into a [`Block`]. `height` here is the
/// ordering sequence number, distinct from a block's height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Monotonically increasing proposal sequence number, starting at 2.
    pub height: u64,
    /// The batch of transactions, in emission order.
    pub transactions: Vec<Transaction>,
}

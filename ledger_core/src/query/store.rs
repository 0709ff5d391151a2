//! `QueryIndex`: the account and (account, asset) secondary indices plus
//! the paged reverse-cursor walk ("pager", `§4.4`).
//!
//! Grounded on the teacher's `query::store` (a live, queryable index kept
//! in step with commits) and `query::pagination` (cursor-shaped reads over
//! a committed history) — collapsed here into one struct sized to this
//! core's three query shapes rather than the teacher's generic,
//! FlatBuffers-facing query engine.

use std::collections::{BTreeSet, HashMap, HashSet};

use ledger_crypto::Hash;

use crate::data_model::prelude::*;

/// A transaction's position within the committed chain.
pub type TxLocation = (u64, u32);

/// Secondary indices over applied transactions (`§4.4`). Rejected
/// transactions are never passed to [`QueryIndex::record`].
#[derive(Default)]
pub struct QueryIndex {
    /// `creator account -> locations`, ascending commit order.
    creator_index: HashMap<AccountId, Vec<TxLocation>>,
    /// `(account, asset) -> locations` touched, ascending commit order.
    touch_index: HashMap<(AccountId, AssetId), Vec<TxLocation>>,
    /// Full transaction bodies by location, for hydrating query results.
    transactions: HashMap<TxLocation, Transaction>,
    /// Transaction hash -> location, for resolving pager cursors.
    hash_location: HashMap<Hash, TxLocation>,
}

/// The `(account, asset)` pairs a transaction's commands touch, per the
/// `§4.4` definition: direct `add_asset_quantity`/`transfer_asset` targets,
/// plus the cross product of every account created and every asset
/// created by this same transaction.
fn touches(tx: &Transaction) -> HashSet<(AccountId, AssetId)> {
    let mut direct = HashSet::new();
    let mut created_accounts = Vec::new();
    let mut created_assets = Vec::new();

    for command in &tx.payload.commands {
        match command {
            Command::AddAssetQuantity {
                account_id,
                asset_id,
                ..
            } => {
                direct.insert((account_id.clone(), asset_id.clone()));
            }
            Command::TransferAsset {
                src_account_id,
                dest_account_id,
                asset_id,
                ..
            } => {
                direct.insert((src_account_id.clone(), asset_id.clone()));
                direct.insert((dest_account_id.clone(), asset_id.clone()));
            }
            Command::CreateAccount { name, domain, .. } => {
                created_accounts.push(AccountId::new(name.clone(), DomainId::new(domain.clone())));
            }
            Command::CreateAsset { name, domain, .. } => {
                created_assets.push(AssetId::new(name.clone(), DomainId::new(domain.clone())));
            }
            Command::CreateDomain { .. }
            | Command::AddSignatory { .. }
            | Command::RemoveSignatory { .. }
            | Command::SetQuorum { .. }
            | Command::AddPeer { .. } => {}
        }
    }

    for account_id in &created_accounts {
        for asset_id in &created_assets {
            direct.insert((account_id.clone(), asset_id.clone()));
        }
    }
    direct
}

impl QueryIndex {
    /// An empty index, for genesis startup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes one applied transaction at `(height, tx_index)`. Must be
    /// called exactly once per applied transaction, in commit order.
    pub fn record(&mut self, height: u64, tx_index: u32, tx: &Transaction) {
        let location = (height, tx_index);
        self.creator_index
            .entry(tx.payload.creator.clone())
            .or_default()
            .push(location);
        for pair in touches(tx) {
            self.touch_index.entry(pair).or_default().push(location);
        }
        self.hash_location.insert(tx.hash().into_hash(), location);
        self.transactions.insert(location, tx.clone());
    }

    /// Transactions created by `account_id`, oldest first.
    #[must_use]
    pub fn get_account_transactions(&self, account_id: &AccountId) -> Vec<Transaction> {
        self.creator_index
            .get(account_id)
            .into_iter()
            .flatten()
            .map(|location| self.transactions[location].clone())
            .collect()
    }

    /// Transactions touching `(account_id, asset_id)`, oldest first, each
    /// yielded at most once.
    #[must_use]
    pub fn get_account_asset_transactions(&self, account_id: &AccountId, asset_id: &AssetId) -> Vec<Transaction> {
        self.touch_index
            .get(&(account_id.clone(), asset_id.clone()))
            .into_iter()
            .flatten()
            .map(|location| self.transactions[location].clone())
            .collect()
    }

    /// The paged reverse-cursor walk (`§4.4`): transactions touching
    /// `(account_id, z)` for any `z` in `asset_ids`, strictly descending by
    /// `(block_height, tx_index)`, starting after `cursor_tx_hash` (or from
    /// the newest if `cursor_tx_hash` is [`Hash::ZERO`]), capped at `limit`.
    ///
    /// Returns an empty list if `limit == 0`, or if `cursor_tx_hash` is
    /// non-zero but not among the matching transactions.
    #[must_use]
    pub fn get_account_assets_transactions_with_pager(
        &self,
        account_id: &AccountId,
        asset_ids: &[AssetId],
        cursor_tx_hash: Hash,
        limit: usize,
    ) -> Vec<Transaction> {
        if limit == 0 {
            return Vec::new();
        }

        let mut ascending = BTreeSet::new();
        for asset_id in asset_ids {
            if let Some(locations) = self.touch_index.get(&(account_id.clone(), asset_id.clone())) {
                ascending.extend(locations.iter().copied());
            }
        }
        let descending: Vec<TxLocation> = ascending.into_iter().rev().collect();

        let start_index = if cursor_tx_hash.is_zero() {
            0
        } else {
            let Some(&cursor_location) = self.hash_location.get(&cursor_tx_hash) else {
                return Vec::new();
            };
            match descending.iter().position(|&location| location == cursor_location) {
                Some(position) => position + 1,
                None => return Vec::new(),
            }
        };

        descending
            .into_iter()
            .skip(start_index)
            .take(limit)
            .map(|location| self.transactions[&location].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ledger_crypto::PublicKey;

    use super::*;

    fn tx(creator: &AccountId, counter: u64, commands: Vec<Command>) -> Transaction {
        Transaction::new(TransactionPayload {
            creator: creator.clone(),
            created_at_ms: counter,
            creator_tx_counter: counter,
            commands,
        })
    }

    #[test]
    fn pager_walks_strictly_descending_with_cursor() {
        let mut index = QueryIndex::new();
        let alice = AccountId::new("alice", DomainId::new("irh"));
        let irh = AssetId::new("irh", DomainId::new("irh"));

        let mut hashes = Vec::new();
        for counter in 2..=6 {
            let transaction = tx(
                &alice,
                counter,
                vec![Command::AddAssetQuantity {
                    account_id: alice.clone(),
                    asset_id: irh.clone(),
                    amount: Quantity::from_parts(1, 0),
                }],
            );
            hashes.push(transaction.hash().into_hash());
            index.record(1, counter as u32, &transaction);
        }
        // hashes[0..5] correspond to T2..T6 by construction order.
        let (t2, t3, _t4, t5, t6) = (hashes[0], hashes[1], hashes[2], hashes[3], hashes[4]);

        let newest = index.get_account_assets_transactions_with_pager(&alice, &[irh.clone()], Hash::ZERO, 1);
        assert_eq!(newest.len(), 1);
        assert_eq!(newest[0].hash().into_hash(), t6);

        let next = index.get_account_assets_transactions_with_pager(&alice, &[irh.clone()], t6, 100);
        let next_hashes: Vec<_> = next.iter().map(|transaction| transaction.hash().into_hash()).collect();
        assert_eq!(next_hashes, vec![t5, hashes[2], t3, t2]);

        assert!(index
            .get_account_assets_transactions_with_pager(&alice, &[irh.clone()], Hash::ZERO, 0)
            .is_empty());

        let all = index.get_account_assets_transactions_with_pager(&alice, &[irh], Hash::ZERO, 100);
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn pager_empty_when_cursor_not_found() {
        let mut index = QueryIndex::new();
        let alice = AccountId::new("alice", DomainId::new("irh"));
        let irh = AssetId::new("irh", DomainId::new("irh"));
        let transaction = tx(
            &alice,
            1,
            vec![Command::AddAssetQuantity {
                account_id: alice.clone(),
                asset_id: irh.clone(),
                amount: Quantity::from_parts(1, 0),
            }],
        );
        index.record(1, 0, &transaction);
        let bogus = Hash::new(b"nonexistent");
        assert!(index
            .get_account_assets_transactions_with_pager(&alice, &[irh], bogus, 10)
            .is_empty());
    }

    #[test]
    fn creation_cross_product_is_touched() {
        let mut index = QueryIndex::new();
        let alice = AccountId::new("alice", DomainId::new("wonderland"));
        let wonder = AssetId::new("wonder", DomainId::new("wonderland"));
        let transaction = tx(
            &alice,
            1,
            vec![
                Command::CreateAccount {
                    name: "alice".into(),
                    domain: "wonderland".into(),
                    public_key: PublicKey::ZERO,
                },
                Command::CreateAsset {
                    name: "wonder".into(),
                    domain: "wonderland".into(),
                    precision: 2,
                },
            ],
        );
        index.record(1, 0, &transaction);
        assert_eq!(index.get_account_asset_transactions(&alice, &wonder).len(), 1);
    }

    #[test]
    fn creator_index_tracks_only_the_creator() {
        let mut index = QueryIndex::new();
        let alice = AccountId::new("alice", DomainId::new("irh"));
        index.record(1, 0, &tx(&alice, 1, vec![]));
        index.record(2, 0, &tx(&alice, 2, vec![]));
        assert_eq!(index.get_account_transactions(&alice).len(), 2);
    }
}

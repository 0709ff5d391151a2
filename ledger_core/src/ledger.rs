//! The storage coordinator (`§4.8`): the top-level object that owns the
//! block store, the WSV and the query index, and is the only thing that
//! can open a [`MutableStorage`] or [`Ledger::commit`] one.

use std::sync::Arc;

use ledger_crypto::Hash;
use parking_lot::RwLock;

use crate::{
    data_model::prelude::*,
    kura::{self, BlockStore, KuraConfiguration},
    query::QueryIndex,
    smartcontracts::Execute,
    state::{self, State, StateBlock},
    wsv::{World, WorldStateView},
};

/// Root configuration for the storage coordinator.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LedgerConfiguration {
    /// Block store configuration.
    pub kura: KuraConfiguration,
}

/// Errors raised by the storage coordinator.
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// block store error: {0}
    Store(#[from] kura::Error),
    /// mutable storage error: {0}
    State(#[from] state::Error),
    /// index inconsistency: {0}
    IndexInconsistency(String),
}

/// The block-level validator predicate of `§4.5`/`§4.6`: gates whether a
/// candidate block's staged writes are ever committed.
pub trait BlockValidator {
    /// Returns `true` if `block` (staged against `view`, whose previous
    /// committed tip was `top_hash`) may be committed.
    fn validate(&self, block: &Block, view: &WorldStateView, top_hash: Hash) -> bool;
}

impl<F> BlockValidator for F
where
    F: Fn(&Block, &WorldStateView, Hash) -> bool,
{
    fn validate(&self, block: &Block, view: &WorldStateView, top_hash: Hash) -> bool {
        self(block, view, top_hash)
    }
}

/// A block-level validator that accepts every candidate unconditionally,
/// for tests and single-node setups with no external consensus gate.
pub struct AcceptAll;

impl BlockValidator for AcceptAll {
    fn validate(&self, _block: &Block, _view: &WorldStateView, _top_hash: Hash) -> bool {
        true
    }
}

struct PendingCommit {
    block: Block,
    applied: Vec<Transaction>,
}

/// A block's worth of staged writes (`§4.6`), obtained from
/// [`Ledger::create_mutable_storage`] and either committed via
/// [`Ledger::commit`] or dropped.
pub struct MutableStorage {
    block: StateBlock,
    pending: Option<PendingCommit>,
}

/// The storage coordinator (C8): owns the block store, the WSV and the
/// query index.
pub struct Ledger {
    kura: BlockStore,
    state: State,
    query_index: RwLock<QueryIndex>,
}

impl Ledger {
    /// Opens the block store at `config.kura.block_store_path` and
    /// rebuilds the WSV and query index by replaying every stored block;
    /// an empty store starts from genesis state.
    ///
    /// # Errors
    /// Propagates block-store I/O/codec/chain errors.
    pub async fn open(config: &LedgerConfiguration) -> Result<Self, Error> {
        let kura = BlockStore::open(&config.kura).await?;
        let world = Arc::new(World::new());
        let state = State::new(Arc::clone(&world));
        let mut query_index = QueryIndex::new();

        let height = kura.height().await;
        if height > 0 {
            let blocks = kura.get_blocks(1, height).await?;
            let mut block_storage = state.create_mutable_storage()?;
            for block in &blocks {
                for tx in &block.transactions {
                    let mut tx_scope = block_storage.transaction();
                    for command in &tx.payload.commands {
                        // Historical blocks were already validated at
                        // commit time; a failing replay would indicate a
                        // corrupt block store, not a rejected tx.
                        let _ = command.execute(&mut tx_scope);
                    }
                    tx_scope.apply();
                }
                for (index, tx) in block.transactions.iter().enumerate() {
                    query_index.record(block.header.height, index as u32, tx);
                }
            }
            block_storage.commit();
        }

        Ok(Self {
            kura,
            state,
            query_index: RwLock::new(query_index),
        })
    }

    /// A read-only handle over the committed WSV (`§4.3`).
    #[must_use]
    pub fn wsv_query(&self) -> WorldStateView {
        WorldStateView::new(self.state.world())
    }

    /// The block store, for `top`/`get_blocks` reads (`§4.2`).
    #[must_use]
    pub fn block_query(&self) -> &BlockStore {
        &self.kura
    }

    /// Reads from the query index (`§4.4`).
    pub fn query_index(&self) -> parking_lot::RwLockReadGuard<'_, QueryIndex> {
        self.query_index.read()
    }

    /// Opens a new mutable storage for one candidate block.
    ///
    /// # Errors
    /// [`state::Error::Busy`] if one is already open.
    pub fn create_mutable_storage(&self) -> Result<MutableStorage, Error> {
        Ok(MutableStorage {
            block: self.state.create_mutable_storage()?,
            pending: None,
        })
    }

    /// Stages `transactions` as a candidate block (`§4.6` steps 1–3):
    /// checks chain linkage, executes each transaction's commands
    /// sequentially (reverting and skipping on the first failing
    /// command), then asks `validator` whether to keep the staged result.
    ///
    /// Returns `true` (and leaves the staged writes in `storage` for
    /// [`Ledger::commit`]) iff the validator accepts; otherwise the
    /// staged writes are discarded and this returns `false`.
    ///
    /// # Errors
    /// Propagates block-store errors reading the current tip.
    pub async fn apply<V: BlockValidator>(
        &self,
        storage: &mut MutableStorage,
        transactions: Vec<Transaction>,
        created_ts: u64,
        validator: &V,
    ) -> Result<bool, Error> {
        let top = self.kura.top().await?;
        let (top_height, prev_hash) = match &top {
            Some(block) => (block.header.height, block.hash().into_hash()),
            None => (0, Hash::ZERO),
        };
        let height = top_height + 1;

        let mut applied = Vec::new();
        let mut rejected = Vec::new();
        for tx in transactions {
            let mut tx_scope = storage.block.transaction();
            let mut succeeded = true;
            for command in &tx.payload.commands {
                if command.execute(&mut tx_scope).is_err() {
                    succeeded = false;
                    break;
                }
            }
            if succeeded {
                tx_scope.apply();
                applied.push(tx);
            } else {
                tx_scope.revert();
                rejected.push(tx);
            }
        }

        let merkle_root = Block::merkle_root_of(&applied);
        let header = BlockHeader {
            height,
            prev_hash,
            merkle_root,
            created_ts,
            txs_number: applied.len() as u64,
        };
        let block = Block {
            header,
            transactions: applied.clone(),
            rejected_transactions: rejected,
        };

        let staged_view = WorldStateView::new(Arc::new(World::from_tables(storage.block.tables().clone())));
        if !validator.validate(&block, &staged_view, prev_hash) {
            storage.pending = None;
            return Ok(false);
        }

        storage.pending = Some(PendingCommit { block, applied });
        Ok(true)
    }

    /// Atomically publishes `storage`'s staged writes: appends the block
    /// to the block store, publishes the WSV snapshot, and records every
    /// applied transaction in the query index. After this returns, every
    /// reader observes the new state.
    ///
    /// # Errors
    /// [`Error::Store`] if the block-store append fails; in debug builds
    /// calling this without a prior successful [`Ledger::apply`] panics,
    /// matching `§7`'s "index inconsistency is a bug" policy, and in
    /// release builds returns [`Error::IndexInconsistency`].
    pub async fn commit(&self, storage: MutableStorage) -> Result<(), Error> {
        let Some(pending) = storage.pending else {
            debug_assert!(false, "commit called without a prior successful apply");
            return Err(Error::IndexInconsistency(
                "commit called without a prior successful apply".into(),
            ));
        };

        self.kura.append(&pending.block).await?;
        storage.block.commit();

        let mut index = self.query_index.write();
        for (tx_index, tx) in pending.applied.iter().enumerate() {
            index.record(pending.block.header.height, tx_index as u32, tx);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ledger_crypto::PublicKey;
    use tempfile::tempdir;

    use super::*;
    use crate::kura::Mode;

    fn tx(creator: &AccountId, counter: u64, commands: Vec<Command>) -> Transaction {
        Transaction::new(TransactionPayload {
            creator: creator.clone(),
            created_at_ms: counter,
            creator_tx_counter: counter,
            commands,
        })
    }

    async fn open_ledger() -> (Ledger, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = LedgerConfiguration {
            kura: KuraConfiguration {
                block_store_path: dir.path().to_path_buf(),
                mode: Mode::Strict,
            },
        };
        (Ledger::open(&config).await.unwrap(), dir)
    }

    #[tokio::test]
    async fn double_create_is_rejected_but_original_survives() {
        let (ledger, _dir) = open_ledger().await;
        let creator = AccountId::new("root", DomainId::new("ru"));

        let mut storage = ledger.create_mutable_storage().unwrap();
        let first_block_txs = vec![tx(
            &creator,
            1,
            vec![
                Command::CreateDomain { name: "ru".into() },
                Command::CreateAccount {
                    name: "user1".into(),
                    domain: "ru".into(),
                    public_key: PublicKey::ZERO,
                },
            ],
        )];
        assert!(ledger.apply(&mut storage, first_block_txs, 1, &AcceptAll).await.unwrap());
        ledger.commit(storage).await.unwrap();

        let mut storage = ledger.create_mutable_storage().unwrap();
        let second_block_txs = vec![tx(
            &creator,
            2,
            vec![Command::CreateAccount {
                name: "user1".into(),
                domain: "ru".into(),
                public_key: PublicKey::ZERO,
            }],
        )];
        assert!(ledger.apply(&mut storage, second_block_txs, 2, &AcceptAll).await.unwrap());
        ledger.commit(storage).await.unwrap();

        let view = ledger.wsv_query();
        let user1 = view.get_account(&AccountId::new("user1", DomainId::new("ru"))).unwrap();
        assert!(user1.signatories.is_empty());
        assert_eq!(ledger.block_query().height().await, 2);
        let second = ledger.block_query().get_blocks(2, 2).await.unwrap();
        assert_eq!(second[0].transactions.len(), 0);
        assert_eq!(second[0].rejected_transactions.len(), 1);
    }

    #[tokio::test]
    async fn transfer_moves_balance() {
        let (ledger, _dir) = open_ledger().await;
        let creator = AccountId::new("root", DomainId::new("ru"));
        let user1 = AccountId::new("user1", DomainId::new("ru"));
        let user2 = AccountId::new("user2", DomainId::new("ru"));
        let rub = AssetId::new("rub", DomainId::new("ru"));

        let mut storage = ledger.create_mutable_storage().unwrap();
        let setup_txs = vec![tx(
            &creator,
            1,
            vec![
                Command::CreateDomain { name: "ru".into() },
                Command::CreateAccount {
                    name: "user1".into(),
                    domain: "ru".into(),
                    public_key: PublicKey::ZERO,
                },
                Command::CreateAccount {
                    name: "user2".into(),
                    domain: "ru".into(),
                    public_key: PublicKey::ZERO,
                },
                Command::CreateAsset {
                    name: "rub".into(),
                    domain: "ru".into(),
                    precision: 2,
                },
                Command::AddAssetQuantity {
                    account_id: user1.clone(),
                    asset_id: rub.clone(),
                    amount: Quantity::from_parts(15000, 2),
                },
            ],
        )];
        assert!(ledger.apply(&mut storage, setup_txs, 1, &AcceptAll).await.unwrap());
        ledger.commit(storage).await.unwrap();

        let mut storage = ledger.create_mutable_storage().unwrap();
        let transfer_txs = vec![tx(
            &user1,
            2,
            vec![Command::TransferAsset {
                src_account_id: user1.clone(),
                dest_account_id: user2.clone(),
                asset_id: rub.clone(),
                amount: Quantity::from_parts(10000, 2),
                description: String::new(),
            }],
        )];
        assert!(ledger.apply(&mut storage, transfer_txs, 2, &AcceptAll).await.unwrap());
        ledger.commit(storage).await.unwrap();

        let view = ledger.wsv_query();
        assert_eq!(view.get_account_asset(&user1, &rub).unwrap(), Quantity::from_parts(5000, 2));
        assert_eq!(view.get_account_asset(&user2, &rub).unwrap(), Quantity::from_parts(10000, 2));
    }

    #[tokio::test]
    async fn rebuild_from_block_store_restores_wsv() {
        let dir = tempdir().unwrap();
        let config = LedgerConfiguration {
            kura: KuraConfiguration {
                block_store_path: dir.path().to_path_buf(),
                mode: Mode::Strict,
            },
        };
        let creator = AccountId::new("root", DomainId::new("ru"));
        {
            let ledger = Ledger::open(&config).await.unwrap();
            let mut storage = ledger.create_mutable_storage().unwrap();
            let setup_txs = vec![tx(&creator, 1, vec![Command::CreateDomain { name: "ru".into() }])];
            assert!(ledger.apply(&mut storage, setup_txs, 1, &AcceptAll).await.unwrap());
            ledger.commit(storage).await.unwrap();
        }

        let reopened = Ledger::open(&config).await.unwrap();
        assert!(reopened.wsv_query().get_domain(&DomainId::new("ru")).is_some());
        assert_eq!(reopened.query_index().get_account_transactions(&creator).len(), 1);
    }
}

//! World-State View: the authoritative, in-memory projection of all
//! committed state (`§4.3`).
//!
//! Mirrors the teacher's `DashMap`-backed `WorldStateView`, but publishes
//! committed state as a single immutable snapshot (`Arc<WorldTables>`)
//! rather than mutating shared maps in place. That is the mechanism behind
//! the "no reader observes a partial block" guarantee of `§5`: a block's
//! worth of writes is assembled off to the side by [`crate::state`] and
//! only becomes visible to readers in one atomic pointer swap.

use std::{collections::HashMap, sync::Arc};

use ledger_crypto::PublicKey;
use parking_lot::RwLock;

use crate::data_model::prelude::*;

/// The committed maps backing a [`World`]. Cheap to snapshot (an `Arc`
/// clone); cloning the struct itself (done once per opened block, by
/// [`crate::state::StateBlock::open`]) clones every map, which is
/// acceptable at the scale this core targets.
#[derive(Clone, Debug, Default)]
pub struct WorldTables {
    pub(crate) domains: HashMap<DomainId, Domain>,
    pub(crate) accounts: HashMap<AccountId, Account>,
    pub(crate) asset_definitions: HashMap<AssetId, AssetDefinition>,
    pub(crate) balances: HashMap<(AccountId, AssetId), Quantity>,
    pub(crate) peers: HashMap<PublicKey, Peer>,
}

/// The committed world-state: one [`RwLock`]-guarded pointer to the
/// current [`WorldTables`], swapped atomically on each commit.
#[derive(Debug, Default)]
pub struct World {
    tables: RwLock<Arc<WorldTables>>,
}

impl World {
    /// An empty world (genesis state).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a world directly from a snapshot, used by [`crate::Ledger`]
    /// when rebuilding from the block store at startup.
    #[must_use]
    pub fn from_tables(tables: WorldTables) -> Self {
        Self {
            tables: RwLock::new(Arc::new(tables)),
        }
    }

    /// Pins the current committed snapshot. Cheap (one `Arc` clone, one
    /// short-lived read-lock acquisition); the returned `Arc` never
    /// changes underneath the caller even if a commit races concurrently.
    #[must_use]
    pub fn snapshot(&self) -> Arc<WorldTables> {
        Arc::clone(&self.tables.read())
    }

    /// Atomically publishes `new` as the committed snapshot. Only ever
    /// called by [`crate::state::StateBlock::commit`], which holds the
    /// coordinator's single-writer guard.
    pub(crate) fn publish(&self, new: Arc<WorldTables>) {
        *self.tables.write() = new;
    }
}

/// A read-only handle over a [`World`]'s committed state (`§4.3`'s read
/// API). Each accessor takes a fresh snapshot, so a long-lived handle
/// always answers with the latest committed block, never a stale or
/// partial one.
#[derive(Clone)]
pub struct WorldStateView {
    world: Arc<World>,
}

impl WorldStateView {
    /// Builds a query handle over `world`.
    #[must_use]
    pub fn new(world: Arc<World>) -> Self {
        Self { world }
    }

    /// Looks up an account by id.
    #[must_use]
    pub fn get_account(&self, id: &AccountId) -> Option<Account> {
        self.world.snapshot().accounts.get(id).cloned()
    }

    /// Looks up an account-asset balance; missing entries are zero-valued
    /// only conceptually — this returns `None` when the account or asset
    /// has never been credited, distinct from an explicit zero balance.
    #[must_use]
    pub fn get_account_asset(&self, account_id: &AccountId, asset_id: &AssetId) -> Option<Quantity> {
        self.world
            .snapshot()
            .balances
            .get(&(account_id.clone(), asset_id.clone()))
            .copied()
    }

    /// Lists an account's signatories, oldest first.
    #[must_use]
    pub fn get_signatories(&self, account_id: &AccountId) -> Option<Vec<PublicKey>> {
        self.world
            .snapshot()
            .accounts
            .get(account_id)
            .map(|account| account.signatories.clone())
    }

    /// Looks up an asset definition by id.
    #[must_use]
    pub fn get_asset(&self, asset_id: &AssetId) -> Option<AssetDefinition> {
        self.world.snapshot().asset_definitions.get(asset_id).cloned()
    }

    /// Looks up a domain by name.
    #[must_use]
    pub fn get_domain(&self, name: &DomainId) -> Option<Domain> {
        self.world.snapshot().domains.get(name).cloned()
    }

    /// Lists all registered peers.
    #[must_use]
    pub fn get_peers(&self) -> Vec<Peer> {
        self.world.snapshot().peers.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use ledger_crypto::PublicKey;

    use super::*;

    fn sample_tables() -> WorldTables {
        let domain = DomainId::new("wonderland");
        let account_id = AccountId::new("alice", domain.clone());
        let mut tables = WorldTables::default();
        tables.domains.insert(domain.clone(), Domain::new(domain));
        tables
            .accounts
            .insert(account_id.clone(), Account::new(account_id, PublicKey::ZERO));
        tables
    }

    #[test]
    fn reads_reflect_published_snapshot() {
        let world = Arc::new(World::from_tables(sample_tables()));
        let view = WorldStateView::new(Arc::clone(&world));
        let domain = DomainId::new("wonderland");
        assert!(view.get_domain(&domain).is_some());
        assert!(view.get_domain(&DomainId::new("nowhere")).is_none());
    }

    #[test]
    fn publish_is_visible_to_existing_handles() {
        let world = Arc::new(World::new());
        let view = WorldStateView::new(Arc::clone(&world));
        assert!(view.get_domain(&DomainId::new("wonderland")).is_none());
        world.publish(Arc::new(sample_tables()));
        assert!(view.get_domain(&DomainId::new("wonderland")).is_some());
    }
}

//! Mutable storage (`§4.6`): a simplified rendering of the teacher's
//! `State` / `WorldBlock` / `WorldTransaction` three-tier staging model.
//!
//! The teacher generalizes this over a `Cell`/`Storage` abstraction shared
//! by many differently-shaped collections (`storage::cell`,
//! `storage::storage`). This core only ever stages one concrete
//! [`WorldTables`] struct, so the generic `Cell`/`Storage` machinery is
//! replaced with plain clone-on-open, clone-on-transaction copies of that
//! struct — the same open/transaction/commit-or-revert shape, sized down
//! to what this spec actually needs.

use std::sync::{atomic::{AtomicBool, Ordering}, Arc};

use crate::wsv::{World, WorldTables};

/// Errors raised opening a new mutable-storage block.
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// another mutable storage block is already open
    Busy,
}

/// Owns the committed [`World`] and hands out at most one open
/// [`StateBlock`] at a time (`§4.6`'s single-writer invariant).
pub struct State {
    world: Arc<World>,
    busy: Arc<AtomicBool>,
}

impl State {
    /// Wraps `world` as a mutable-storage coordinator.
    #[must_use]
    pub fn new(world: Arc<World>) -> Self {
        Self {
            world,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Opens a new block-scoped staging area, cloned from the current
    /// committed snapshot.
    ///
    /// # Errors
    /// [`Error::Busy`] if a [`StateBlock`] opened earlier is still live.
    pub fn create_mutable_storage(&self) -> Result<StateBlock, Error> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(Error::Busy);
        }
        Ok(StateBlock {
            tables: (*self.world.snapshot()).clone(),
            world: Arc::clone(&self.world),
            busy: Arc::clone(&self.busy),
        })
    }

    /// The world this storage publishes commits to, for wiring up a
    /// [`crate::wsv::WorldStateView`].
    #[must_use]
    pub fn world(&self) -> Arc<World> {
        Arc::clone(&self.world)
    }
}

/// A block's worth of staged mutations, invisible to readers until
/// [`StateBlock::commit`].
pub struct StateBlock {
    pub(crate) tables: WorldTables,
    world: Arc<World>,
    busy: Arc<AtomicBool>,
}

impl StateBlock {
    /// Opens a transaction-scoped view over this block's working tables,
    /// snapshotting them so a failed command can cheaply roll back without
    /// discarding commands already applied earlier in the same block.
    pub fn transaction(&mut self) -> StateTransaction<'_> {
        StateTransaction {
            snapshot: self.tables.clone(),
            block: self,
        }
    }

    /// Publishes this block's staged tables as the new committed snapshot.
    /// Consumes `self`; the single-writer guard is released on drop
    /// either way.
    pub fn commit(self) {
        self.world.publish(Arc::new(self.tables.clone()));
    }

    /// The working tables as staged so far, for the executor's read-only
    /// lookups that don't need transaction-scoped rollback (e.g. checking
    /// `touches (account, asset)` context while building the query index).
    #[must_use]
    pub fn tables(&self) -> &WorldTables {
        &self.tables
    }
}

impl Drop for StateBlock {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// A single command's worth of staged mutations within an open
/// [`StateBlock`]. Dropping or calling [`StateTransaction::revert`]
/// without calling [`StateTransaction::apply`] restores the block's
/// tables to how they were before this transaction opened.
pub struct StateTransaction<'block> {
    snapshot: WorldTables,
    block: &'block mut StateBlock,
}

impl<'block> StateTransaction<'block> {
    /// Read-write access to the block's staged tables, as mutated so far
    /// by this transaction.
    pub fn tables_mut(&mut self) -> &mut WorldTables {
        &mut self.block.tables
    }

    /// Read-only access to the block's staged tables.
    #[must_use]
    pub fn tables(&self) -> &WorldTables {
        &self.block.tables
    }

    /// Keeps this transaction's mutations staged in the block.
    pub fn apply(self) {}

    /// Discards this transaction's mutations, restoring the block's
    /// tables to their pre-transaction contents.
    pub fn revert(self) {
        self.block.tables = self.snapshot;
    }
}

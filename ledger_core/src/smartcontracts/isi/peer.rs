//! `add_peer` (`§4.5`).

use ledger_crypto::PublicKey;

use super::CmdError;
use crate::{data_model::prelude::*, state::StateTransaction};

pub(super) fn add_peer(
    tx: &mut StateTransaction<'_>,
    public_key: PublicKey,
    address: &str,
) -> Result<(), CmdError> {
    let tables = tx.tables_mut();
    if tables.peers.contains_key(&public_key) {
        return Err(CmdError::Duplicate(format!("peer {public_key}")));
    }
    tables.peers.insert(public_key, Peer::new(public_key, address));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{state::State, wsv::World};

    #[test]
    fn rejects_duplicate_peer() {
        let state = State::new(Arc::new(World::new()));
        let mut block = state.create_mutable_storage().unwrap();
        let mut tx = block.transaction();
        assert!(add_peer(&mut tx, PublicKey::ZERO, "127.0.0.1:1337").is_ok());
        assert!(matches!(
            add_peer(&mut tx, PublicKey::ZERO, "127.0.0.1:1338"),
            Err(CmdError::Duplicate(_))
        ));
    }
}

//! `create_account`, `add_signatory`, `remove_signatory`, `set_quorum`
//! (`§4.5`).

use ledger_crypto::PublicKey;

use super::CmdError;
use crate::{data_model::prelude::*, state::StateTransaction};

pub(super) fn create_account(
    tx: &mut StateTransaction<'_>,
    name: &str,
    domain: &str,
    public_key: PublicKey,
) -> Result<(), CmdError> {
    let domain_id = DomainId::new(domain);
    let account_id = AccountId::new(name, domain_id.clone());
    let tables = tx.tables_mut();
    if !tables.domains.contains_key(&domain_id) {
        return Err(CmdError::Missing(format!("domain {domain_id}")));
    }
    if tables.accounts.contains_key(&account_id) {
        return Err(CmdError::Duplicate(format!("account {account_id}")));
    }
    tables
        .accounts
        .insert(account_id.clone(), Account::new(account_id, public_key));
    Ok(())
}

pub(super) fn add_signatory(
    tx: &mut StateTransaction<'_>,
    account_id: &AccountId,
    public_key: PublicKey,
) -> Result<(), CmdError> {
    let tables = tx.tables_mut();
    let account = tables
        .accounts
        .get_mut(account_id)
        .ok_or_else(|| CmdError::Missing(format!("account {account_id}")))?;
    if account.has_signatory(&public_key) {
        return Err(CmdError::Duplicate(format!(
            "signatory {public_key} on {account_id}"
        )));
    }
    account.signatories.push(public_key);
    Ok(())
}

pub(super) fn remove_signatory(
    tx: &mut StateTransaction<'_>,
    account_id: &AccountId,
    public_key: PublicKey,
) -> Result<(), CmdError> {
    let tables = tx.tables_mut();
    let account = tables
        .accounts
        .get_mut(account_id)
        .ok_or_else(|| CmdError::Missing(format!("account {account_id}")))?;
    let position = account
        .signatories
        .iter()
        .position(|key| *key == public_key)
        .ok_or_else(|| CmdError::Missing(format!("signatory {public_key} on {account_id}")))?;
    let remaining = account.signatories.len() as u32 - 1;
    if remaining < account.quorum {
        return Err(CmdError::QuorumViolation(format!(
            "removing signatory would leave {remaining} keys below quorum {}",
            account.quorum
        )));
    }
    account.signatories.remove(position);
    Ok(())
}

pub(super) fn set_quorum(
    tx: &mut StateTransaction<'_>,
    account_id: &AccountId,
    quorum: u32,
) -> Result<(), CmdError> {
    let tables = tx.tables_mut();
    let account = tables
        .accounts
        .get_mut(account_id)
        .ok_or_else(|| CmdError::Missing(format!("account {account_id}")))?;
    if quorum < 1 || quorum as usize > account.signatories.len() {
        return Err(CmdError::QuorumViolation(format!(
            "quorum {quorum} invalid for {} signatories",
            account.signatories.len()
        )));
    }
    account.quorum = quorum;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{smartcontracts::isi::domain::create_domain, state::State, wsv::World};

    fn key(byte: u8) -> PublicKey {
        PublicKey([byte; 32])
    }

    #[test]
    fn quorum_blocks_signatory_removal_below_threshold() {
        let state = State::new(Arc::new(World::new()));
        let mut block = state.create_mutable_storage().unwrap();
        let mut tx = block.transaction();
        create_domain(&mut tx, "ru").unwrap();
        let account_id = AccountId::new("user2", DomainId::new("ru"));
        create_account(&mut tx, "user2", "ru", key(1)).unwrap();
        add_signatory(&mut tx, &account_id, key(2)).unwrap();
        set_quorum(&mut tx, &account_id, 2).unwrap();

        assert!(matches!(
            remove_signatory(&mut tx, &account_id, key(2)),
            Err(CmdError::QuorumViolation(_))
        ));

        set_quorum(&mut tx, &account_id, 1).unwrap();
        assert!(remove_signatory(&mut tx, &account_id, key(2)).is_ok());
    }

    #[test]
    fn create_account_requires_existing_domain() {
        let state = State::new(Arc::new(World::new()));
        let mut block = state.create_mutable_storage().unwrap();
        let mut tx = block.transaction();
        assert!(matches!(
            create_account(&mut tx, "user1", "ru", key(1)),
            Err(CmdError::Missing(_))
        ));
    }
}

//! `create_asset`, `add_asset_quantity`, `transfer_asset` (`§4.5`).

use super::CmdError;
use crate::{data_model::prelude::*, state::StateTransaction};

pub(super) fn create_asset(
    tx: &mut StateTransaction<'_>,
    name: &str,
    domain: &str,
    precision: u8,
) -> Result<(), CmdError> {
    let domain_id = DomainId::new(domain);
    let asset_id = AssetId::new(name, domain_id.clone());
    let tables = tx.tables_mut();
    if !tables.domains.contains_key(&domain_id) {
        return Err(CmdError::Missing(format!("domain {domain_id}")));
    }
    if tables.asset_definitions.contains_key(&asset_id) {
        return Err(CmdError::Duplicate(format!("asset {asset_id}")));
    }
    // `precision` is a `u8`, so "precision > 255" from `§4.5` can never
    // occur here; the type itself enforces the invariant.
    tables
        .asset_definitions
        .insert(asset_id.clone(), AssetDefinition::new(asset_id, precision));
    Ok(())
}

pub(super) fn add_asset_quantity(
    tx: &mut StateTransaction<'_>,
    account_id: &AccountId,
    asset_id: &AssetId,
    amount: Quantity,
) -> Result<(), CmdError> {
    let tables = tx.tables_mut();
    if !tables.accounts.contains_key(account_id) {
        return Err(CmdError::Missing(format!("account {account_id}")));
    }
    let asset = tables
        .asset_definitions
        .get(asset_id)
        .cloned()
        .ok_or_else(|| CmdError::Missing(format!("asset {asset_id}")))?;
    if amount.is_zero() {
        return Err(CmdError::BadAmount);
    }
    if amount.precision() != asset.precision {
        return Err(CmdError::PrecisionMismatch {
            expected: asset.precision,
            got: amount.precision(),
        });
    }
    let key = (account_id.clone(), asset_id.clone());
    let current = tables
        .balances
        .get(&key)
        .copied()
        .unwrap_or_else(|| Quantity::zero(asset.precision));
    let updated = current.checked_add(&amount).map_err(|_| CmdError::BadAmount)?;
    tables.balances.insert(key, updated);
    Ok(())
}

pub(super) fn transfer_asset(
    tx: &mut StateTransaction<'_>,
    src_account_id: &AccountId,
    dest_account_id: &AccountId,
    asset_id: &AssetId,
    amount: Quantity,
) -> Result<(), CmdError> {
    let tables = tx.tables_mut();
    if src_account_id == dest_account_id {
        return Err(CmdError::Duplicate(format!(
            "transfer source and destination are the same account: {src_account_id}"
        )));
    }
    if !tables.accounts.contains_key(src_account_id) {
        return Err(CmdError::Missing(format!("account {src_account_id}")));
    }
    if !tables.accounts.contains_key(dest_account_id) {
        return Err(CmdError::Missing(format!("account {dest_account_id}")));
    }
    let asset = tables
        .asset_definitions
        .get(asset_id)
        .cloned()
        .ok_or_else(|| CmdError::Missing(format!("asset {asset_id}")))?;
    if amount.is_zero() {
        return Err(CmdError::BadAmount);
    }
    if amount.precision() != asset.precision {
        return Err(CmdError::PrecisionMismatch {
            expected: asset.precision,
            got: amount.precision(),
        });
    }

    let src_key = (src_account_id.clone(), asset_id.clone());
    let dest_key = (dest_account_id.clone(), asset_id.clone());
    let src_balance = tables
        .balances
        .get(&src_key)
        .copied()
        .unwrap_or_else(|| Quantity::zero(asset.precision));
    let dest_balance = tables
        .balances
        .get(&dest_key)
        .copied()
        .unwrap_or_else(|| Quantity::zero(asset.precision));

    let new_src = src_balance
        .checked_sub(&amount)
        .map_err(|_| CmdError::InsufficientFunds {
            balance: src_balance,
            amount,
        })?;
    let new_dest = dest_balance.checked_add(&amount).map_err(|_| CmdError::BadAmount)?;

    tables.balances.insert(src_key, new_src);
    tables.balances.insert(dest_key, new_dest);
    Ok(())
}

//! `create_domain` (`§4.5`).

use super::CmdError;
use crate::{data_model::prelude::*, state::StateTransaction};

pub(super) fn create_domain(tx: &mut StateTransaction<'_>, name: &str) -> Result<(), CmdError> {
    let domain_id = DomainId::new(name);
    let tables = tx.tables_mut();
    if tables.domains.contains_key(&domain_id) {
        return Err(CmdError::Duplicate(format!("domain {domain_id}")));
    }
    tables.domains.insert(domain_id.clone(), Domain::new(domain_id));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{state::State, wsv::World};

    #[test]
    fn rejects_duplicate() {
        let state = State::new(Arc::new(World::new()));
        let mut block = state.create_mutable_storage().unwrap();
        let mut tx = block.transaction();
        assert!(create_domain(&mut tx, "ru").is_ok());
        assert!(matches!(create_domain(&mut tx, "ru"), Err(CmdError::Duplicate(_))));
    }
}

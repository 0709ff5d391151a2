//! Accounts: an identity, a quorum, and an ordered set of signatories.

use std::fmt::{self, Debug};

use ledger_crypto::PublicKey;
use serde::{Deserialize, Serialize};

use super::domain::DomainId;

/// An account identifier, `"<name>@<domain>"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId {
    /// The account's name, unique within its domain.
    pub name: String,
    /// The domain this account belongs to.
    pub domain: DomainId,
}

impl AccountId {
    /// Builds an account id from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: DomainId) -> Self {
        Self {
            name: name.into(),
            domain,
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.domain)
    }
}

/// A registered account.
///
/// `signatories` preserves insertion order and never contains duplicates;
/// `quorum` is always in `1..=signatories.len()` once the account exists
/// (invariant 1 of `§3`), enforced entirely by the command executor, never
/// by this type's constructors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// This account's identity.
    pub id: AccountId,
    /// Minimum number of signatories required to authorise a transaction.
    pub quorum: u32,
    /// Keys authorised to sign on this account's behalf, oldest first.
    pub signatories: Vec<PublicKey>,
}

impl Account {
    /// Creates an account with quorum 1 and the given initial signatory,
    /// or no signatories at all if `initial_signatory` is [`PublicKey::ZERO`].
    #[must_use]
    pub fn new(id: AccountId, initial_signatory: PublicKey) -> Self {
        let signatories = if initial_signatory.is_zero() {
            Vec::new()
        } else {
            vec![initial_signatory]
        };
        Self {
            id,
            quorum: 1,
            signatories,
        }
    }

    /// `true` if `key` is already a signatory on this account.
    #[must_use]
    pub fn has_signatory(&self, key: &PublicKey) -> bool {
        self.signatories.contains(key)
    }
}

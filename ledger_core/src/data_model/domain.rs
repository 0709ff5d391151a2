//! Domains: created once, never mutated, never removed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A domain name, e.g. `wonderland`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DomainId(pub String);

impl DomainId {
    /// Wraps a plain name as a [`DomainId`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered domain. Carries no data of its own beyond its identity:
/// accounts and asset definitions reference it by [`DomainId`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// This domain's identity.
    pub id: DomainId,
}

impl Domain {
    /// Creates a new, empty domain.
    #[must_use]
    pub fn new(id: DomainId) -> Self {
        Self { id }
    }
}

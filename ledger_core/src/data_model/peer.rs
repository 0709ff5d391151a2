//! Peers: the set of nodes the ordering service addresses proposals to.

use ledger_crypto::PublicKey;
use serde::{Deserialize, Serialize};

/// A network participant the ordering service may send proposals to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// The peer's public key, its unique identity.
    pub public_key: PublicKey,
    /// An opaque transport address, e.g. `"127.0.0.1:1337"`.
    pub address: String,
}

impl Peer {
    /// Creates a peer from its key and address.
    #[must_use]
    pub fn new(public_key: PublicKey, address: impl Into<String>) -> Self {
        Self {
            public_key,
            address: address.into(),
        }
    }
}

//! The key-management collaborator (`§6`): loads or creates an account's
//! `Ed25519` keypair from a pair of hex files. Not part of the ledger/
//! consensus core proper — included because it sits at the boundary and a
//! node needs it to produce signed genesis transactions and test fixtures.

use std::path::PathBuf;

use ledger_crypto::{Hash, KeyPair};
use tokio::fs;

/// Errors raised loading or creating key files.
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum Error {
    /// I/O error accessing key files
    Io(#[from] std::io::Error),
    /// stored key material is not valid hex or the wrong length
    Corrupt,
}

/// Reads and writes `<account>.pub`/`<account>.priv` hex files under a
/// directory.
pub struct KeysManager {
    directory: PathBuf,
}

impl KeysManager {
    /// Points a key manager at `directory`; the directory need not exist
    /// yet (created lazily by [`KeysManager::create`]).
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn priv_path(&self, account: &str) -> PathBuf {
        self.directory.join(format!("{account}.priv"))
    }

    fn pub_path(&self, account: &str) -> PathBuf {
        self.directory.join(format!("{account}.pub"))
    }

    /// Loads `account`'s keypair from its `.priv` file, or `None` if no
    /// such file exists.
    ///
    /// # Errors
    /// [`Error::Corrupt`] if the file exists but isn't a valid 32-byte hex
    /// seed; [`Error::Io`] for any other I/O failure.
    pub async fn load(&self, account: &str) -> Result<Option<KeyPair>, Error> {
        let contents = match fs::read_to_string(self.priv_path(account)).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let seed = hex::decode(contents.trim()).map_err(|_| Error::Corrupt)?;
        let keys = KeyPair::from_seed(&seed).map_err(|_| Error::Corrupt)?;
        Ok(Some(keys))
    }

    /// Derives a keypair from `passphrase` (hashed into a 32-byte seed)
    /// and writes both key files. Returns `false`, writing nothing, if
    /// either file already exists.
    ///
    /// # Errors
    /// I/O errors creating the directory or writing either file.
    pub async fn create(&self, account: &str, passphrase: &str) -> Result<bool, Error> {
        fs::create_dir_all(&self.directory).await?;
        let priv_path = self.priv_path(account);
        let pub_path = self.pub_path(account);
        if fs::try_exists(&priv_path).await? || fs::try_exists(&pub_path).await? {
            return Ok(false);
        }

        let seed = Hash::new(passphrase.as_bytes());
        let keys = KeyPair::from_seed(seed.as_bytes()).expect("a Hash is always exactly 32 bytes");
        fs::write(&priv_path, hex::encode(seed.as_bytes())).await?;
        fs::write(&pub_path, hex::encode(keys.public_key().0)).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn create_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let manager = KeysManager::new(dir.path());
        assert!(manager.create("alice", "hunter2").await.unwrap());
        let loaded = manager.load("alice").await.unwrap().unwrap();
        let recreated = manager.create("alice", "hunter2").await.unwrap();
        assert!(!recreated);

        let direct = KeyPair::from_seed(Hash::new(b"hunter2").as_bytes()).unwrap();
        assert_eq!(loaded.public_key(), direct.public_key());
    }

    #[tokio::test]
    async fn load_missing_account_returns_none() {
        let dir = tempdir().unwrap();
        let manager = KeysManager::new(dir.path());
        assert!(manager.load("nobody").await.unwrap().is_none());
    }
}

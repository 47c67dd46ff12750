//! Durable storage for the auth token.
//!
//! The token is the only client state that survives a restart. It lives in
//! one file under a fixed name; the decoded profile is never written to
//! disk and is refetched on startup instead.

use log::warn;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub struct TokenVault {
    path: PathBuf,
}

impl TokenVault {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The persisted token, if any. Unreadable files are treated as
    /// absent so a corrupt vault degrades to "signed out".
    pub fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("TokenVault: failed to read {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub fn store(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
    }

    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_token() {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("nested").join("session.token"));

        assert_eq!(vault.load(), None);
        vault.store("tok-123").unwrap();
        assert_eq!(vault.load(), Some("tok-123".to_string()));
        vault.clear().unwrap();
        assert_eq!(vault.load(), None);
    }

    #[test]
    fn clearing_a_missing_vault_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("session.token"));
        vault.clear().unwrap();
    }

    #[test]
    fn whitespace_only_vault_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("session.token"));
        vault.store("  \n").unwrap();
        assert_eq!(vault.load(), None);
    }
}

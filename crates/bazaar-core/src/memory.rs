//! In-memory credential store.

use std::sync::RwLock;

use crate::tokens::CredentialPair;
use crate::traits::CredentialStore;

/// A process-local credential store.
///
/// Used by tests and by embedders that persist credentials themselves.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    pair: RwLock<Option<CredentialPair>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a pair.
    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: RwLock::new(Some(pair)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<CredentialPair> {
        self.pair.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save(&self, pair: &CredentialPair) {
        let mut guard = self.pair.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(pair.clone());
    }

    fn clear(&self) {
        let mut guard = self.pair.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

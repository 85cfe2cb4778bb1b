//! Credential storage trait.

use std::sync::Arc;

use crate::tokens::CredentialPair;

/// Durable holder of the current credential pair.
///
/// Implementations are shared process-wide. Storage failures never reach
/// the caller: an unreadable medium loads as empty, and failed writes are
/// logged by the implementation.
pub trait CredentialStore: Send + Sync {
    /// Returns the persisted pair, if any.
    fn load(&self) -> Option<CredentialPair>;

    /// Persist a pair, replacing any previous one.
    fn save(&self, pair: &CredentialPair);

    /// Remove any persisted pair.
    fn clear(&self);
}

impl<S: CredentialStore + ?Sized> CredentialStore for Arc<S> {
    fn load(&self) -> Option<CredentialPair> {
        (**self).load()
    }

    fn save(&self, pair: &CredentialPair) {
        (**self).save(pair)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

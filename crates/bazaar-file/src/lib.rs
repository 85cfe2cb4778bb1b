//! bazaar-file - Filesystem-backed credential persistence.

mod store;

pub use store::{FileCredentialStore, StoredCredentials};

//! Core traits for the storefront data-access layer.

mod credential_store;
mod page_source;

pub use credential_store::CredentialStore;
pub use page_source::{Keyed, PageSource};

//! bazaar-core - Core types and traits for the storefront data-access layer.

pub mod credentials;
pub mod error;
pub mod memory;
pub mod page;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::{Error, ErrorKind};
pub use memory::MemoryCredentialStore;
pub use page::{Page, PageRequest};
pub use tokens::{AccessToken, CredentialPair, RefreshToken};
pub use traits::{CredentialStore, Keyed, PageSource};
pub use types::{ApiOrigin, ListFilters, ProductId, ProductSummary, UserId, UserSummary};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

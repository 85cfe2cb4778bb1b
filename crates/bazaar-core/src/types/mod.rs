//! Validated types for the storefront API.

mod api_origin;
mod catalog;
mod ids;

pub use api_origin::{API_PREFIX, ApiOrigin};
pub use catalog::{ListFilters, ProductSummary, UserSummary};
pub use ids::{ProductId, UserId};

//! Paged data source trait.

use std::hash::Hash;

use async_trait::async_trait;

use crate::Result;
use crate::page::Page;

/// An item with a stable identity used to de-duplicate across pages.
pub trait Keyed {
    /// The identity type.
    type Key: Eq + Hash + Clone + Send + Sync;

    /// Returns this item's identity.
    fn key(&self) -> Self::Key;
}

/// A screen-supplied fetch function for one paginated list.
///
/// Must behave as a pure function of `(page, page_size, filters)`;
/// implementations route through the authenticated client.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Item type yielded by this source.
    type Item: Keyed + Clone + Send + Sync + 'static;
    /// Filter and sort parameters supplied by the screen.
    type Filters: Clone + Default + Send + Sync + 'static;

    /// Fetch one page. `page` starts at 1.
    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &Self::Filters,
    ) -> Result<Page<Self::Item>>;
}

//! bazaar-feed - Incremental list loading for paginated screens.
//!
//! A [`ListController`] owns one screen's collection and page cursor. The
//! screen forwards scroll positions and "load more" clicks; the controller
//! decides when to fetch, merges pages without duplicates, and exposes a
//! [`ListSnapshot`] to render.

mod collection;
mod controller;
mod scroll;
mod stream;

pub use collection::ItemCollection;
pub use controller::{
    CursorState, DEFAULT_AUTO_SCROLL_PAGE_LIMIT, DEFAULT_NEAR_BOTTOM_THRESHOLD, DEFAULT_PAGE_SIZE,
    FetchFailure, ListConfig, ListController, ListSnapshot, LoadOutcome, SkipReason,
};
pub use scroll::{LoadMode, ScrollMetrics};
pub use stream::pages;

//! Page envelope shared by every paginated endpoint.

use serde::{Deserialize, Serialize};

/// One page of items plus the known extent of the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page, in server order.
    pub items: Vec<T>,
    /// Total number of pages for the current filters.
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_pages: u32) -> Self {
        Self { items, total_pages }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }
}

/// Query parameters identifying one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Pages are 1-based; zero is bumped to the first page.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

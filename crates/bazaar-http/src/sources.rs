//! Page sources for the storefront's paginated screens.
//!
//! Each source is a thin binding from a screen's list to one collection
//! endpoint; the list controller drives them.

use async_trait::async_trait;

use bazaar_core::{
    ListFilters, Page, PageSource, ProductId, ProductSummary, Result, UserId, UserSummary,
};

use crate::client::ApiClient;
use crate::endpoints::{FAVORITES, PRODUCTS};

/// Home feed: every listed product, filterable and sortable.
#[derive(Debug, Clone)]
pub struct HomeFeed {
    client: ApiClient,
}

impl HomeFeed {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HomeFeed {
    type Item = ProductSummary;
    type Filters = ListFilters;

    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &ListFilters,
    ) -> Result<Page<ProductSummary>> {
        self.client
            .fetch_page(PRODUCTS, page, page_size, filters)
            .await
    }
}

/// Products the signed-in user has favorited.
#[derive(Debug, Clone)]
pub struct Favorites {
    client: ApiClient,
}

impl Favorites {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for Favorites {
    type Item = ProductSummary;
    type Filters = ();

    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &(),
    ) -> Result<Page<ProductSummary>> {
        self.client
            .fetch_page(FAVORITES, page, page_size, filters)
            .await
    }
}

/// Products listed by one seller, as shown on their profile.
#[derive(Debug, Clone)]
pub struct SellerListings {
    client: ApiClient,
    path: String,
}

impl SellerListings {
    pub fn new(client: ApiClient, seller: &UserId) -> Self {
        Self {
            client,
            path: format!("/users/{}/products", seller),
        }
    }
}

#[async_trait]
impl PageSource for SellerListings {
    type Item = ProductSummary;
    type Filters = ListFilters;

    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &ListFilters,
    ) -> Result<Page<ProductSummary>> {
        self.client
            .fetch_page(&self.path, page, page_size, filters)
            .await
    }
}

/// Followers of one user.
#[derive(Debug, Clone)]
pub struct Followers {
    client: ApiClient,
    path: String,
}

impl Followers {
    pub fn new(client: ApiClient, user: &UserId) -> Self {
        Self {
            client,
            path: format!("/users/{}/followers", user),
        }
    }
}

#[async_trait]
impl PageSource for Followers {
    type Item = UserSummary;
    type Filters = ();

    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &(),
    ) -> Result<Page<UserSummary>> {
        self.client
            .fetch_page(&self.path, page, page_size, filters)
            .await
    }
}

/// Other products from the seller of a given product.
#[derive(Debug, Clone)]
pub struct MoreFromSeller {
    client: ApiClient,
    path: String,
}

impl MoreFromSeller {
    pub fn new(client: ApiClient, product: &ProductId) -> Self {
        Self {
            client,
            path: format!("/products/{}/more-from-seller", product),
        }
    }
}

#[async_trait]
impl PageSource for MoreFromSeller {
    type Item = ProductSummary;
    type Filters = ();

    async fn fetch_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &(),
    ) -> Result<Page<ProductSummary>> {
        self.client
            .fetch_page(&self.path, page, page_size, filters)
            .await
    }
}

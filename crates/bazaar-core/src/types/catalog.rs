//! Catalog models exchanged with paginated endpoints.

use serde::{Deserialize, Serialize};

use crate::traits::Keyed;

use super::ids::{ProductId, UserId};

/// A product as it appears in list views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub price: Option<serde_json::Number>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub seller_id: Option<UserId>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl Keyed for ProductSummary {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.id.clone()
    }
}

/// A user as it appears in follower and following lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Keyed for UserSummary {
    type Key = UserId;

    fn key(&self) -> UserId {
        self.id.clone()
    }
}

/// Filter and sort parameters shared by the catalog list screens.
///
/// Serialized as query parameters; unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
}

impl ListFilters {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = (!term.trim().is_empty()).then_some(term);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

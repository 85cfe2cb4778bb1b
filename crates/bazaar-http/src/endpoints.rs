//! Endpoint paths and wire types for the storefront API.

use serde::{Deserialize, Serialize};

use bazaar_core::CredentialPair;
use bazaar_core::error::{Error, InvalidInputError};

// ============================================================================
// Endpoint Paths
// ============================================================================

/// Exchange email and password for a credential pair.
pub const LOGIN: &str = "/auth/login";

/// Exchange a refresh token for a new credential pair.
pub const REFRESH: &str = "/auth/refresh";

/// Revoke the current refresh token.
pub const LOGOUT: &str = "/auth/logout";

/// Current user's profile.
pub const ME: &str = "/users/me";

/// Home feed of products.
pub const PRODUCTS: &str = "/products";

/// Current user's favorites.
pub const FAVORITES: &str = "/favorites";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for login.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Request body for refresh and logout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response from login and refresh.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenResponse {
    pub fn into_pair(self) -> Result<CredentialPair, Error> {
        CredentialPair::from_parts(&self.access_token, &self.refresh_token).ok_or_else(|| {
            InvalidInputError::Other {
                message: "token response is missing a token".to_string(),
            }
            .into()
        })
    }
}

/// Error body returned by the API on failure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

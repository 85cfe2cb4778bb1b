//! Authenticated storefront API client.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace, warn};

use bazaar_core::error::{AuthError, Error, TransportError};
use bazaar_core::{
    AccessToken, ApiOrigin, CredentialPair, CredentialStore, Credentials, Page, PageRequest,
    RefreshToken, Result,
};

use crate::config::ClientConfig;
use crate::endpoints::{LOGIN, LOGOUT, LoginRequest, ME, REFRESH, RefreshRequest, TokenResponse};
use crate::refresh::{RefreshCoordinator, SessionEvent};
use crate::request::{ApiRequest, ApiResponse};

/// HTTP client for the storefront API.
///
/// Cheap to clone; clones share the connection pool, the credential store,
/// and the refresh coordinator.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use bazaar_core::{ApiOrigin, Credentials, MemoryCredentialStore};
/// use bazaar_http::{ApiClient, ApiRequest, ClientConfig};
///
/// # async fn example() -> Result<(), bazaar_core::Error> {
/// let origin = ApiOrigin::new("https://shop.example.com/api")?;
/// let client = ApiClient::new(
///     ClientConfig::new(origin),
///     Arc::new(MemoryCredentialStore::new()),
/// )?;
///
/// client.login(Credentials::new("alice@example.com", "hunter2")).await?;
/// let response = client.send(ApiRequest::get("/api/favorites")).await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a client bound to a credential store.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                refresh: RefreshCoordinator::new(store.clone()),
                config,
                store,
            }),
        })
    }

    /// Returns the API origin this client talks to.
    pub fn origin(&self) -> &ApiOrigin {
        &self.inner.config.origin
    }

    /// Returns the refresh coordinator owned by this client.
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    /// Subscribe to session lifecycle events.
    ///
    /// [`SessionEvent::Terminated`] means the stored credentials are gone and
    /// the user must log in again.
    pub fn session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.refresh.subscribe()
    }

    /// Whether a credential pair is currently stored.
    pub fn is_logged_in(&self) -> bool {
        self.inner.store.load().is_some()
    }

    /// Send a request, recovering once from an expired access token.
    ///
    /// Non-401 responses are returned unchanged, including business errors.
    /// A 401 on an authenticated request triggers one coordinated refresh
    /// and a single replay; a 401 that cannot be recovered becomes
    /// [`AuthError::Unauthorized`].
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.inner.config.origin.endpoint(&request.path);

        let sent_token = if request.requires_auth {
            self.inner.store.load().map(|pair| pair.access_token)
        } else {
            None
        };

        let response = self.dispatch(&url, &request, sent_token.as_ref()).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        if !request.requires_auth {
            return Err(unauthorized(&response));
        }

        if self.inner.store.load().is_none() {
            if let Some(err) = sent_token
                .as_ref()
                .and_then(|token| self.inner.refresh.rejection_for(token))
            {
                debug!("Session already terminated by an earlier refresh");
                return Err(err.into());
            }
            debug!("Unauthorized with no refresh token available");
            return Err(unauthorized(&response));
        }

        let fresh = self
            .inner
            .refresh
            .refresh(sent_token.as_ref(), |refresh_token| {
                self.exchange(refresh_token)
            })
            .await?;

        debug!("Replaying request with refreshed credentials");
        let retried = self.dispatch(&url, &request, Some(&fresh)).await?;
        if retried.is_unauthorized() {
            warn!("Request still unauthorized after refresh");
            return Err(unauthorized(&retried));
        }

        Ok(retried)
    }

    /// Send a request and decode a successful JSON body.
    pub async fn request_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        self.send(request).await?.into_json()
    }

    /// Authenticated GET decoded as JSON.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.request_json(ApiRequest::get(path)).await
    }

    /// Authenticated POST with a JSON body, decoded as JSON.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request_json(ApiRequest::post(path).json(body)?).await
    }

    /// Authenticated DELETE, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(ApiRequest::delete(path))
            .await?
            .error_for_status()
            .map(|_| ())
    }

    /// Fetch one page of a paginated collection.
    pub async fn fetch_page<T, F>(
        &self,
        path: &str,
        page: u32,
        page_size: u32,
        filters: &F,
    ) -> Result<Page<T>>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let request = ApiRequest::get(path)
            .with_query(&PageRequest::new(page, page_size))?
            .with_query(filters)?;
        self.request_json(request).await
    }

    /// The signed-in user's profile.
    pub async fn me(&self) -> Result<serde_json::Value> {
        self.get_json(ME).await
    }

    /// Log in and persist the issued credential pair.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: Credentials) -> Result<()> {
        info!("Logging in");

        let body = LoginRequest {
            email: credentials.email(),
            password: credentials.password(),
        };
        let request = ApiRequest::post(LOGIN).without_auth().json(&body)?;

        let response = match self.send(request).await {
            Err(Error::Auth(AuthError::Unauthorized { .. })) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            other => other?,
        };

        let pair = response.into_json::<TokenResponse>()?.into_pair()?;
        self.inner.store.save(&pair);
        self.inner.refresh.emit(SessionEvent::LoggedIn);

        debug!("Logged in");
        Ok(())
    }

    /// Revoke the refresh token server-side (best effort) and clear local
    /// credentials.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        if let Some(pair) = self.inner.store.load() {
            let body = RefreshRequest {
                refresh_token: pair.refresh_token.as_str(),
            };
            let request = ApiRequest::post(LOGOUT).json(&body)?;
            match self.send(request).await {
                Ok(response) if response.is_success() => debug!("Refresh token revoked"),
                Ok(response) => debug!(status = response.status(), "Logout not acknowledged"),
                Err(e) => debug!(error = %e, "Logout request failed"),
            }
        }

        self.inner.store.clear();
        self.inner.refresh.emit(SessionEvent::LoggedOut);
        info!("Logged out");
        Ok(())
    }

    /// Force a refresh exchange now.
    ///
    /// Shares the single-flight guard with automatic refreshes.
    pub async fn refresh_now(&self) -> Result<()> {
        let current = self.inner.store.load().map(|pair| pair.access_token);
        self.inner
            .refresh
            .refresh(current.as_ref(), |refresh_token| {
                self.exchange(refresh_token)
            })
            .await?;
        Ok(())
    }

    /// Exchange a refresh token for a new pair.
    ///
    /// Bypasses [`ApiClient::send`]: no access token is attached and a 401
    /// here never recurses into another refresh.
    #[instrument(skip_all)]
    async fn exchange(&self, refresh_token: RefreshToken) -> Result<CredentialPair> {
        let url = self.inner.config.origin.endpoint(REFRESH);
        let body = RefreshRequest {
            refresh_token: refresh_token.as_str(),
        };
        let request = ApiRequest::post(REFRESH).without_auth().json(&body)?;

        let response = self.dispatch(&url, &request, None).await?;
        response.into_json::<TokenResponse>()?.into_pair()
    }

    async fn dispatch(
        &self,
        url: &str,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<ApiResponse> {
        trace!(%url, authed = token.is_some(), "Dispatching");

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, bearer(token)?);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        trace!(status, bytes = body.len(), "Response");
        Ok(ApiResponse::new(status, body.to_vec()))
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        let err = if err.is_timeout() {
            TransportError::Timeout {
                duration_ms: self.inner.config.timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            TransportError::Connection {
                message: err.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            TransportError::Decode {
                message: err.to_string(),
            }
        } else {
            TransportError::Http {
                message: err.to_string(),
            }
        };
        Error::Transport(err)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("origin", &self.inner.config.origin)
            .field("refresh", &self.inner.refresh)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

fn bearer(token: &AccessToken) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str())).map_err(|_| {
        bazaar_core::error::InvalidInputError::Other {
            message: "access token contains invalid header characters".to_string(),
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}

fn unauthorized(response: &ApiResponse) -> Error {
    let err = response.protocol_error();
    AuthError::Unauthorized {
        message: err
            .message
            .or(err.error)
            .unwrap_or_else(|| "HTTP 401".to_string()),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::MemoryCredentialStore;

    #[test]
    fn bearer_header_is_sensitive() {
        let value = bearer(&AccessToken::new("abc")).unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
        assert!(value.is_sensitive());
    }

    #[test]
    fn bearer_rejects_control_characters() {
        assert!(bearer(&AccessToken::new("bad\ntoken")).is_err());
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let store = Arc::new(MemoryCredentialStore::with_pair(CredentialPair::new(
            "secret-access",
            "secret-refresh",
        )));
        let client = ApiClient::new(
            ClientConfig::new(ApiOrigin::new("https://shop.example.com").unwrap()),
            store,
        )
        .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret-access"));
        assert!(debug.contains("shop.example.com"));
    }
}

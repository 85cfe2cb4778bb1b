//! Request and response values passed through the client.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use bazaar_core::Result;
use bazaar_core::error::{InvalidInputError, ProtocolError, TransportError};

use crate::endpoints::ErrorResponse;

/// One outbound API call.
///
/// Requests are plain values so the client can replay them after a
/// credential refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<serde_json::Value>,
    pub(crate) requires_auth: bool,
}

impl ApiRequest {
    /// Create a request. Authentication is attached by default.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            requires_auth: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Send without an Authorization header and never attempt a refresh.
    pub fn without_auth(mut self) -> Self {
        self.requires_auth = false;
        self
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| InvalidInputError::Other {
            message: format!("request body: {}", e),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Append a single query parameter.
    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append every field of a serializable struct as query parameters.
    ///
    /// `None` fields are skipped; nested values are rejected.
    pub fn with_query<Q: Serialize + ?Sized>(mut self, params: &Q) -> Result<Self> {
        let value = serde_json::to_value(params).map_err(|e| InvalidInputError::Other {
            message: format!("query parameters: {}", e),
        })?;

        match value {
            serde_json::Value::Null => {}
            serde_json::Value::Object(map) => {
                for (key, value) in map {
                    match value {
                        serde_json::Value::Null => {}
                        serde_json::Value::String(s) => self.query.push((key, s)),
                        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => {
                            self.query.push((key, value.to_string()))
                        }
                        _ => {
                            return Err(InvalidInputError::Other {
                                message: format!("query parameter '{}' is not a scalar", key),
                            }
                            .into());
                        }
                    }
                }
            }
            _ => {
                return Err(InvalidInputError::Other {
                    message: "query parameters must serialize to an object".to_string(),
                }
                .into());
            }
        }

        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }
}

/// A fully buffered API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    body: Vec<u8>,
}

impl ApiResponse {
    pub(crate) fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON regardless of status.
    pub fn json<R: DeserializeOwned>(&self) -> Result<R> {
        serde_json::from_slice(&self.body).map_err(|e| {
            TransportError::Decode {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Build the protocol error describing a non-success response.
    pub fn protocol_error(&self) -> ProtocolError {
        match serde_json::from_slice::<ErrorResponse>(&self.body) {
            Ok(body) => ProtocolError::new(self.status, body.error, body.message),
            Err(_) => ProtocolError::new(self.status, None, None),
        }
    }

    /// Pass successes through; turn anything else into a protocol error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.protocol_error().into())
        }
    }

    /// Decode a successful body, or return the protocol error.
    pub fn into_json<R: DeserializeOwned>(self) -> Result<R> {
        self.error_for_status()?.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::Error;
    use bazaar_core::ListFilters;

    #[test]
    fn requests_authenticate_by_default() {
        assert!(ApiRequest::get("/products").requires_auth());
        assert!(!ApiRequest::post("/auth/login").without_auth().requires_auth());
    }

    #[test]
    fn with_query_flattens_scalars_and_skips_none() {
        let filters = ListFilters::default().search("lamp");
        let request = ApiRequest::get("/products")
            .query_param("page", 2)
            .with_query(&filters)
            .unwrap();
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("search".to_string(), "lamp".to_string()),
            ]
        );
    }

    #[test]
    fn with_query_accepts_unit() {
        let request = ApiRequest::get("/favorites").with_query(&()).unwrap();
        assert!(request.query.is_empty());
    }

    #[test]
    fn with_query_rejects_nested_values() {
        let nested = serde_json::json!({ "filter": { "a": 1 } });
        assert!(ApiRequest::get("/products").with_query(&nested).is_err());
    }

    #[test]
    fn error_body_is_parsed_into_protocol_error() {
        let response = ApiResponse::new(
            409,
            br#"{"error":"AlreadySold","message":"item is no longer available"}"#.to_vec(),
        );
        match response.into_json::<serde_json::Value>() {
            Err(Error::Protocol(err)) => {
                assert_eq!(err.status, 409);
                assert_eq!(err.error.as_deref(), Some("AlreadySold"));
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn non_json_error_body_keeps_status() {
        let response = ApiResponse::new(502, b"Bad Gateway".to_vec());
        let err = response.protocol_error();
        assert_eq!(err.status, 502);
        assert!(err.error.is_none());
    }
}

// ABOUTME: Registered-client validation against the stored redirect allow-list
// ABOUTME: parse_redirect_uris is the single point that absorbs legacy column encodings
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Parley Project

use crate::database::Database;
use crate::models::OAuthClient;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;

/// Decode a stored redirect-URI column into a canonical list
///
/// Observed encodings in the wild: a native JSON array, a JSON-encoded string
/// wrapping an array or a single URI, and a bare scalar written without any
/// JSON encoding. Everything funnels through here so the rest of the registry
/// only ever sees a `Vec<String>`.
#[must_use]
pub fn parse_redirect_uris(raw: &str) -> Vec<String> {
    fn from_value(value: Value) -> Option<Vec<String>> {
        match value {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            Value::String(inner) => {
                // A JSON string either wraps more JSON or is itself the URI
                match serde_json::from_str::<Value>(&inner) {
                    Ok(nested @ (Value::Array(_) | Value::String(_))) => from_value(nested),
                    _ => Some(vec![inner]),
                }
            }
            _ => None,
        }
    }

    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(from_value)
        .unwrap_or_else(|| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_owned()]
            }
        })
}

/// Client registry validating (client_id, redirect_uri) pairs
#[derive(Clone)]
pub struct ClientRegistry {
    database: Arc<Database>,
}

impl ClientRegistry {
    /// Create a registry over the given database
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Validate a client identifier and redirect URI pair
    ///
    /// Returns the client only when it exists and `redirect_uri` exactly
    /// string-matches one entry of its allow-list. Callers surface a `None`
    /// as a single "invalid client_id or redirect_uri" failure without
    /// distinguishing the two cases, which prevents redirect-URI enumeration.
    ///
    /// # Errors
    /// Returns an error if the database lookup fails
    pub async fn validate(
        &self,
        client_id: &str,
        redirect_uri: &str,
    ) -> Result<Option<OAuthClient>> {
        let Some(client) = self.database.get_client_by_client_id(client_id).await? else {
            tracing::debug!("Authorization attempt for unknown client_id");
            return Ok(None);
        };

        if client.redirect_uris.iter().any(|uri| uri == redirect_uri) {
            Ok(Some(client))
        } else {
            tracing::warn!(
                "Redirect URI not in allow-list for client {}",
                client.client_id
            );
            Ok(None)
        }
    }

    /// Look up a client by public id without redirect validation
    ///
    /// Used by the token endpoint, which authenticates with the client secret
    /// instead of a redirect URI.
    ///
    /// # Errors
    /// Returns an error if the database lookup fails
    pub async fn get_client(&self, client_id: &str) -> Result<Option<OAuthClient>> {
        self.database.get_client_by_client_id(client_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_native_array() {
        let uris = parse_redirect_uris(r#"["https://a.test/cb","https://b.test/cb"]"#);
        assert_eq!(uris.len(), 2);
        assert_eq!(uris[0], "https://a.test/cb");
    }

    #[test]
    fn test_parse_json_encoded_string_of_array() {
        let uris = parse_redirect_uris(r#""[\"https://a.test/cb\"]""#);
        assert_eq!(uris, vec!["https://a.test/cb".to_owned()]);
    }

    #[test]
    fn test_parse_json_encoded_scalar() {
        let uris = parse_redirect_uris(r#""https://a.test/cb""#);
        assert_eq!(uris, vec!["https://a.test/cb".to_owned()]);
    }

    #[test]
    fn test_parse_bare_scalar() {
        let uris = parse_redirect_uris("https://a.test/cb");
        assert_eq!(uris, vec!["https://a.test/cb".to_owned()]);
    }

    #[test]
    fn test_parse_garbage_yields_itself_as_scalar() {
        // Whatever was stored is treated as the single allowed value; a
        // malformed entry can then never match a well-formed request URI
        let uris = parse_redirect_uris("{not valid json");
        assert_eq!(uris, vec!["{not valid json".to_owned()]);
    }

    #[test]
    fn test_parse_empty_yields_empty_set() {
        assert!(parse_redirect_uris("").is_empty());
        assert!(parse_redirect_uris("   ").is_empty());
    }

    #[test]
    fn test_parse_ignores_non_string_array_items() {
        let uris = parse_redirect_uris(r#"["https://a.test/cb", 42, null]"#);
        assert_eq!(uris, vec!["https://a.test/cb".to_owned()]);
    }
}

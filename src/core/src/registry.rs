//! Registry credential encoding.
//!
//! The Docker Engine API takes push/pull credentials as a base64url-encoded
//! JSON document in the `X-Registry-Auth` header.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::Serialize;

use crate::config::RegistryConfig;
use crate::error::Result;

/// Credential document understood by the Docker Engine API.
///
/// Empty fields are omitted, as the engine's own `AuthConfig` does.
#[derive(Debug, Serialize)]
struct AuthConfig<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    username: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    password: &'a str,
}

/// Encode a username/password pair for the `X-Registry-Auth` header.
pub fn encode_auth(username: &str, password: &str) -> Result<String> {
    let doc = AuthConfig { username, password };
    let json = serde_json::to_vec(&doc)?;
    Ok(URL_SAFE.encode(json))
}

impl RegistryConfig {
    /// Username from the `auth` map, empty if not set.
    pub fn username(&self) -> &str {
        self.auth.get("username").map(String::as_str).unwrap_or("")
    }

    /// Password from the `auth` map, empty if not set.
    pub fn password(&self) -> &str {
        self.auth.get("password").map(String::as_str).unwrap_or("")
    }

    /// Encoded credentials for this registry.
    pub fn encoded_auth(&self) -> Result<String> {
        encode_auth(self.username(), self.password())
    }
}

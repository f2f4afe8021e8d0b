use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings for the remote HID-issuing service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuerSettings {
    /// Base URL of the issuing authority, e.g. `https://hid.example.org`.
    #[serde(default)]
    pub base_url: String,

    /// Path prefix for block fetches; the client id is appended.
    #[serde(default = "default_next_block_path")]
    pub next_block_path: String,

    /// Path prefix for mark-used notifications; the identifier is appended.
    #[serde(default = "default_mark_used_path")]
    pub mark_used_path: String,

    /// Sent as the `client_id` header and as the block-fetch path segment.
    #[serde(default)]
    pub client_id: String,

    /// Sent as the `From` header on issuer requests.
    #[serde(default)]
    pub requester: String,

    /// Timeout applied to every issuer and identity-provider request.
    /// A timed-out call is indistinguishable from any other transport
    /// failure.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            next_block_path: default_next_block_path(),
            mark_used_path: default_mark_used_path(),
            client_id: String::new(),
            requester: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl IssuerSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_next_block_path() -> String {
    "/healthIds/nextBlock".to_string()
}

fn default_mark_used_path() -> String {
    "/healthIds/markUsed".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Sign-in settings for the identity provider that issues access tokens
/// for the issuer API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Full sign-in endpoint URL, e.g. `https://idp.example.org/signin`.
    #[serde(default)]
    pub signin_url: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password: String,

    /// Static client token sent as `X-Auth-Token` on the sign-in request.
    #[serde(default)]
    pub auth_token: String,

    #[serde(default)]
    pub client_id: String,
}

//! HTTP clients for the remote HID-issuing authority.
//!
//! Implements the [`IssuerGateway`](healthid_core::IssuerGateway) seam from
//! `healthid-core` against the issuer's REST surface, plus the identity
//! provider sign-in that supplies its access tokens:
//!
//! - `GET {base}/healthIds/nextBlock/{client_id}?blockSize={n}` — fetch a
//!   block of fresh identifiers
//! - `PUT {base}/healthIds/markUsed/{id}` — report a consumed identifier
//! - `POST {idp}/signin` — exchange credentials for an access token
//!
//! Tokens are cached in-process and refreshed once per call on an
//! authentication failure. All requests share one timeout-bounded client;
//! a timeout is reported as a transport failure.

pub mod config;
pub mod identity;
pub mod issuer;

pub use config::{IdentitySettings, IssuerSettings};
pub use identity::IdentityClient;
pub use issuer::HttpIssuerGateway;

use healthid_core::GatewayError;

/// Maps a reqwest failure (connect error, timeout, body read) to
/// [`GatewayError::Transport`].
pub(crate) fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Transport(format!("request timed out: {e}"))
    } else {
        GatewayError::Transport(e.to_string())
    }
}

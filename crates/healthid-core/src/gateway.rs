use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::hid::HealthId;

/// Errors from the remote issuing authority or the identity provider.
///
/// All of these are contained inside replenishment and mark-used handling;
/// none of them ever reach allocation callers.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Credential rejected. The HTTP gateway drops its cached token and
    /// retries once before returning this.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Network failure, timeout, or an unexpected response status.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The remote answered but the body could not be decoded.
    #[error("invalid issuer response: {0}")]
    InvalidResponse(String),
}

/// Client seam for the remote HID-issuing authority.
///
/// The core crate only depends on this trait; the HTTP implementation lives
/// in `healthid-client`, and tests script their own.
#[async_trait]
pub trait IssuerGateway: Send + Sync {
    /// Fetches a block of fresh, globally-unique identifiers.
    async fn fetch_block(&self, block_size: u32) -> Result<Vec<HealthId>, GatewayError>;

    /// Notifies the issuer that `id` was consumed by a created record at
    /// `used_at`. Ownership of the identifier's used/unused status passes
    /// to the issuer once this succeeds.
    async fn notify_used(&self, id: &HealthId, used_at: OffsetDateTime)
    -> Result<(), GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_error_display() {
        let err = GatewayError::Auth("token expired".to_string());
        assert_eq!(err.to_string(), "authentication rejected: token expired");

        let err = GatewayError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport failure: connection refused");

        let err = GatewayError::InvalidResponse("missing hids field".to_string());
        assert_eq!(err.to_string(), "invalid issuer response: missing hids field");
    }
}

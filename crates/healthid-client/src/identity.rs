use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use healthid_core::GatewayError;

use crate::config::IdentitySettings;

#[derive(Debug, Deserialize)]
struct SigninResponse {
    access_token: String,
}

/// Client for the identity provider's sign-in endpoint.
///
/// Exchanges the configured credentials for an access token that the issuer
/// API accepts in `X-Auth-Token`. Caching lives in
/// [`HttpIssuerGateway`](crate::HttpIssuerGateway); this client always does a
/// fresh sign-in.
pub struct IdentityClient {
    http: Client,
    settings: IdentitySettings,
}

impl IdentityClient {
    pub fn new(http: Client, settings: IdentitySettings) -> Self {
        Self { http, settings }
    }

    /// Signs in with form credentials and returns the access token.
    pub async fn sign_in(&self) -> Result<String, GatewayError> {
        debug!(url = %self.settings.signin_url, "signing in to identity provider");

        let response = self
            .http
            .post(&self.settings.signin_url)
            .header("X-Auth-Token", &self.settings.auth_token)
            .header("client_id", &self.settings.client_id)
            .form(&[
                ("email", self.settings.email.as_str()),
                ("password", self.settings.password.as_str()),
            ])
            .send()
            .await
            .map_err(crate::transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Auth(format!(
                "sign-in rejected with status {status}"
            )));
        }
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "sign-in failed with status {status}"
            )));
        }

        let body: SigninResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        Ok(body.access_token)
    }
}

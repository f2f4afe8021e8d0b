use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use healthid_core::{GatewayError, HealthId, IssuerGateway};

use crate::config::{IdentitySettings, IssuerSettings};
use crate::identity::IdentityClient;

#[derive(Debug, Deserialize)]
struct NextBlockResponse {
    total: u32,
    hids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MarkUsedBody {
    #[serde(with = "time::serde::rfc3339")]
    used_at: OffsetDateTime,
}

/// HTTP implementation of [`IssuerGateway`] with an in-process token cache.
///
/// The access token is obtained from the identity provider on first use and
/// cached until the issuer signals an authentication failure, at which point
/// the cache is dropped and the call re-authenticates and retries exactly
/// once before giving up.
pub struct HttpIssuerGateway {
    http: Client,
    settings: IssuerSettings,
    identity: IdentityClient,
    token: RwLock<Option<String>>,
}

impl HttpIssuerGateway {
    /// Builds the gateway and its identity client over one shared HTTP
    /// client, bounded by the configured request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new(settings: IssuerSettings, identity_settings: IdentitySettings) -> Self {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .expect("Failed to create HTTP client");

        let identity = IdentityClient::new(http.clone(), identity_settings);
        Self {
            http,
            settings,
            identity,
            token: RwLock::new(None),
        }
    }

    async fn token(&self) -> Result<String, GatewayError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        self.refresh_token().await
    }

    async fn refresh_token(&self) -> Result<String, GatewayError> {
        let token = self.identity.sign_in().await?;
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    async fn invalidate_token(&self) {
        *self.token.write().await = None;
    }

    fn next_block_url(&self) -> String {
        format!(
            "{}{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.next_block_path,
            self.settings.client_id
        )
    }

    fn mark_used_url(&self, id: &HealthId) -> String {
        format!(
            "{}{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.mark_used_path,
            id
        )
    }

    async fn fetch_block_once(
        &self,
        token: &str,
        block_size: u32,
    ) -> Result<Vec<HealthId>, GatewayError> {
        let response = self
            .http
            .get(self.next_block_url())
            .query(&[("blockSize", block_size)])
            .header("X-Auth-Token", token)
            .header("client_id", &self.settings.client_id)
            .header("From", &self.settings.requester)
            .send()
            .await
            .map_err(crate::transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Auth(format!(
                "block fetch rejected with status {status}"
            )));
        }
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "block fetch failed with status {status}"
            )));
        }

        let body: NextBlockResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        if body.total as usize != body.hids.len() {
            warn!(
                total = body.total,
                received = body.hids.len(),
                "issuer block count does not match its total field"
            );
        }

        Ok(body.hids.into_iter().map(HealthId::from).collect())
    }

    async fn notify_used_once(
        &self,
        token: &str,
        id: &HealthId,
        used_at: OffsetDateTime,
    ) -> Result<(), GatewayError> {
        let response = self
            .http
            .put(self.mark_used_url(id))
            .header("X-Auth-Token", token)
            .header("client_id", &self.settings.client_id)
            .header("From", &self.settings.requester)
            .json(&MarkUsedBody { used_at })
            .send()
            .await
            .map_err(crate::transport_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Auth(format!(
                "mark-used rejected with status {status}"
            )));
        }
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "mark-used failed with status {status}"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl IssuerGateway for HttpIssuerGateway {
    async fn fetch_block(&self, block_size: u32) -> Result<Vec<HealthId>, GatewayError> {
        let token = self.token().await?;
        match self.fetch_block_once(&token, block_size).await {
            Err(GatewayError::Auth(reason)) => {
                debug!(%reason, "issuer rejected cached token, re-authenticating once");
                self.invalidate_token().await;
                let token = self.refresh_token().await?;
                self.fetch_block_once(&token, block_size).await
            }
            other => other,
        }
    }

    async fn notify_used(
        &self,
        id: &HealthId,
        used_at: OffsetDateTime,
    ) -> Result<(), GatewayError> {
        let token = self.token().await?;
        match self.notify_used_once(&token, id, used_at).await {
            Err(GatewayError::Auth(reason)) => {
                debug!(%reason, "issuer rejected cached token, re-authenticating once");
                self.invalidate_token().await;
                let token = self.refresh_token().await?;
                self.notify_used_once(&token, id, used_at).await
            }
            other => other,
        }
    }
}

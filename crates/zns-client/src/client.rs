//! ZNS HTTP client.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::config::ZnsConfig;
use crate::error::ZnsError;
use crate::types::{ApiResponse, SendReceipt, TemplateMessage};

/// Client for the ZNS template message API.
#[derive(Clone)]
pub struct ZnsClient {
    http: Client,
    config: ZnsConfig,
}

impl ZnsClient {
    /// Build a client. No request is made until the first send.
    pub fn new(config: ZnsConfig) -> Result<Self, ZnsError> {
        if config.access_token.trim().is_empty() {
            return Err(ZnsError::Config("access token is empty".to_string()));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().map_err(ZnsError::Http)?;

        info!("ZNS client ready for {}", config.base_url);
        Ok(Self { http, config })
    }

    /// Send a template message.
    ///
    /// Returns `ZnsError::Api` when the provider rejects the message.
    pub async fn send_template(&self, message: &TemplateMessage) -> Result<SendReceipt, ZnsError> {
        let url = self.config.template_url();
        debug!(
            phone = %message.phone,
            template_id = %message.template_id,
            tracking_id = ?message.tracking_id,
            "ZNS send"
        );

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .header("access_token", &self.config.access_token)
            .json(message)
            .send()
            .await
            .map_err(ZnsError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ZnsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let api: ApiResponse = response.json().await.map_err(ZnsError::Http)?;

        if api.error != 0 {
            return Err(ZnsError::Api {
                code: api.error,
                message: api.message,
            });
        }

        Ok(SendReceipt {
            message: api.message,
            sent: api.data.unwrap_or_default(),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ZnsConfig {
        &self.config
    }
}

impl std::fmt::Debug for ZnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZnsClient")
            .field("config", &self.config)
            .finish()
    }
}

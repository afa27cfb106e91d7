//! Offer capability backed by the campaign HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::http_client;
use crate::error::FulfillmentError;
use crate::services::offers::FAILED_ACCEPTING_OFFER;
use crate::services::{OfferAcceptance, OfferService};

#[derive(Debug, Default, Deserialize)]
struct AcceptResponse {
    #[serde(default)]
    success: bool,
}

/// Returns true when the campaign API confirmed the acceptance.
pub fn is_accepted(status: StatusCode, body: &str) -> bool {
    status == StatusCode::OK
        && serde_json::from_str::<AcceptResponse>(body)
            .map(|response| response.success)
            .unwrap_or(false)
}

/// Campaign API client.
pub struct HttpOfferClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl HttpOfferClient {
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FulfillmentError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        })
    }
}

#[async_trait]
impl OfferService for HttpOfferClient {
    #[tracing::instrument(
        skip_all,
        fields(account_id = %acceptance.account_id, offer_id = %acceptance.offer_id)
    )]
    async fn accept_offer(&self, acceptance: &OfferAcceptance) -> Result<(), FulfillmentError> {
        let response = self
            .client
            .post(format!("{}/account/campaign/accept", self.base_url))
            .bearer_auth(&self.api_token)
            .json(acceptance)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !is_accepted(status, &body) {
            tracing::warn!(%status, "campaign API refused offer acceptance");
            return Err(FulfillmentError::OfferAcceptance(
                FAILED_ACCEPTING_OFFER.to_string(),
            ));
        }
        Ok(())
    }
}

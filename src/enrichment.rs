// src/enrichment.rs
use crate::error::{AppError, Result};
use crate::models::{EnrichmentResult, ExternalInfoResponse};
use log::debug;
use reqwest::Client;
use std::sync::Arc;
use urlencoding::encode;

/// Fetches live price data for one provider coin id. Requests carry no user
/// header.
#[derive(Clone)]
pub struct EnrichmentFetcher {
    client: Client,
    base_url: Arc<str>,
}

impl EnrichmentFetcher {
    pub fn new(client: Client, base_url: &str) -> Self {
        EnrichmentFetcher {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }

    /// Never fails: any network, status or parse problem yields the
    /// null-valued result so a single coin cannot affect the rest of a sync.
    pub async fn fetch(&self, coin_id: &str) -> EnrichmentResult {
        match self.try_fetch(coin_id).await {
            Ok(result) => result,
            Err(e) => {
                debug!("Enrichment for {} dropped: {}", coin_id, e);
                EnrichmentResult::default()
            }
        }
    }

    async fn try_fetch(&self, coin_id: &str) -> Result<EnrichmentResult> {
        let url = format!("{}/coins/{}/external-info", self.base_url, encode(coin_id));
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Request { status, body });
        }

        let payload: ExternalInfoResponse = serde_json::from_slice(&response.bytes().await?)?;
        Ok(payload.data.map(EnrichmentResult::from).unwrap_or_default())
    }
}

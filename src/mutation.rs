// src/mutation.rs
use crate::api::ApiClient;
use crate::error::{AppError, Result};
use crate::models::AddFavoriteRequest;
use crate::panel::{
    RowId, SharedPanel, StatusKind, MSG_ADDED, MSG_ADDING, MSG_ADD_FAILED, MSG_EMPTY_SYMBOL,
    MSG_REMOVED, MSG_REMOVE_FAILED,
};
use crate::sync::{SyncOutcome, SyncPipeline};
use log::{error, info};
use serde_json::Value;
use urlencoding::encode;

/// Add and remove favourites. Every confirmed change is followed by a full
/// reload; nothing is applied to the panel before the backend agrees.
#[derive(Clone)]
pub struct MutationController {
    api: ApiClient,
    pipeline: SyncPipeline,
    panel: SharedPanel,
}

pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl MutationController {
    pub fn new(api: ApiClient, pipeline: SyncPipeline, panel: SharedPanel) -> Self {
        MutationController {
            api,
            pipeline,
            panel,
        }
    }

    /// Adds whatever is in the panel's symbol input.
    pub async fn add(&self) -> Result<SyncOutcome> {
        let (symbol, api) = {
            let mut panel = self.panel.lock().await;
            let symbol = normalize_symbol(panel.symbol_input());
            if symbol.is_empty() {
                panel.set_status(StatusKind::Err, MSG_EMPTY_SYMBOL);
                return Err(AppError::Validation(MSG_EMPTY_SYMBOL.to_string()));
            }
            panel.set_status(StatusKind::Info, MSG_ADDING);
            (symbol, self.api.for_user(panel.user_input()))
        };

        let request = AddFavoriteRequest {
            symbol: symbol.clone(),
        };
        if let Err(e) = api.post::<_, Value>("/coins", &request).await {
            error!("Failed to add favourite {}: {}", symbol, e);
            self.panel
                .lock()
                .await
                .set_status(StatusKind::Err, MSG_ADD_FAILED);
            return Err(e);
        }
        info!("Added favourite {} for user {}", symbol, api.user());

        {
            let mut panel = self.panel.lock().await;
            panel.clear_symbol_input();
            panel.set_status(StatusKind::Ok, MSG_ADDED);
        }
        self.pipeline.run().await
    }

    /// Removes the row matching a symbol or 1-based position.
    pub async fn remove_matching(&self, query: &str) -> Result<SyncOutcome> {
        let row = self.panel.lock().await.find_row(query);
        match row {
            Some(row) => self.remove(row).await,
            None => {
                let message = format!("No favourite '{}' on the panel.", query.trim());
                self.reject(message).await
            }
        }
    }

    async fn reject(&self, message: String) -> Result<SyncOutcome> {
        self.panel.lock().await.set_status(StatusKind::Err, &message);
        Err(AppError::Validation(message))
    }

    pub async fn remove(&self, row: RowId) -> Result<SyncOutcome> {
        let found = {
            let panel = self.panel.lock().await;
            panel
                .row(row)
                .map(|row| (row.item.symbol.clone(), self.api.for_user(panel.user_input())))
        };
        let Some((symbol, api)) = found else {
            return self
                .reject("That row is no longer displayed.".to_string())
                .await;
        };

        let path = format!("/coins/{}", encode(&symbol));
        if let Err(e) = api.delete::<Value>(&path).await {
            error!("Failed to remove favourite {}: {}", symbol, e);
            self.panel
                .lock()
                .await
                .set_status(StatusKind::Err, MSG_REMOVE_FAILED);
            return Err(e);
        }
        info!("Removed favourite {} for user {}", symbol, api.user());

        self.panel
            .lock()
            .await
            .set_status(StatusKind::Ok, MSG_REMOVED);
        self.pipeline.run().await
    }
}

// src/sync.rs
use crate::api::ApiClient;
use crate::enrichment::EnrichmentFetcher;
use crate::error::Result;
use crate::models::FavoritesResponse;
use crate::panel::{PatchOutcome, RowId, SharedPanel};
use crate::resolver;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub cycle: u64,
    pub item_count: usize,
    pub dispatched: usize,
    pub unresolved: usize,
    /// A newer cycle started before this one's list arrived; nothing was rendered.
    pub superseded: bool,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub applied: usize,
    pub empty: usize,
    pub stale: usize,
    pub aborted: usize,
}

/// The enrichment tasks of one cycle. Dropping this detaches the tasks; they
/// keep running and patch the panel if their rows still exist.
#[derive(Debug, Default)]
pub struct EnrichmentTasks {
    handles: Vec<JoinHandle<PatchOutcome>>,
}

impl EnrichmentTasks {
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Resolves once every task of the cycle has reported.
    pub async fn settled(self) -> EnrichmentSummary {
        let mut summary = EnrichmentSummary::default();
        for handle in self.handles {
            match handle.await {
                Ok(PatchOutcome::Applied) => summary.applied += 1,
                Ok(PatchOutcome::Empty) => summary.empty += 1,
                Ok(PatchOutcome::Stale) => summary.stale += 1,
                Err(e) => {
                    warn!("Enrichment task aborted: {}", e);
                    summary.aborted += 1;
                }
            }
        }
        summary
    }
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub report: SyncReport,
    pub enrichment: EnrichmentTasks,
}

#[derive(Clone)]
pub struct SyncPipeline {
    api: ApiClient,
    fetcher: EnrichmentFetcher,
    panel: SharedPanel,
}

impl SyncPipeline {
    pub fn new(api: ApiClient, fetcher: EnrichmentFetcher, panel: SharedPanel) -> Self {
        SyncPipeline {
            api,
            fetcher,
            panel,
        }
    }

    /// Loads the favourites, renders placeholder rows, then fans out one
    /// enrichment task per resolvable row. Returns as soon as the list is
    /// rendered; prices keep arriving afterwards.
    pub async fn run(&self) -> Result<SyncOutcome> {
        let (cycle, api) = {
            let mut panel = self.panel.lock().await;
            let cycle = panel.begin_cycle();
            (cycle, self.api.for_user(panel.user_input()))
        };
        info!("Sync cycle {} started for user {}", cycle, api.user());

        let response: FavoritesResponse = match api.get("/coins").await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to load favourites: {}", e);
                self.panel.lock().await.fail(cycle);
                return Err(e);
            }
        };
        let item_count = response.items.len();

        let targets = {
            let mut panel = self.panel.lock().await;
            let Some(ids) = panel.render_skeleton(cycle, response.items) else {
                info!("Sync cycle {} superseded before rendering", cycle);
                return Ok(SyncOutcome {
                    report: SyncReport {
                        cycle,
                        item_count,
                        dispatched: 0,
                        unresolved: 0,
                        superseded: true,
                        loaded_at: Utc::now(),
                    },
                    enrichment: EnrichmentTasks::default(),
                });
            };
            ids.into_iter()
                .filter_map(|id| {
                    let row = panel.row(id)?;
                    match resolver::resolve(&row.item.symbol) {
                        Some(coin_id) => Some((id, coin_id)),
                        None => {
                            debug!("No price source for '{}', row stays blank", row.item.symbol);
                            None
                        }
                    }
                })
                .collect::<Vec<(RowId, &'static str)>>()
        };
        let unresolved = item_count - targets.len();

        let loaded_at = Utc::now();
        self.panel.lock().await.settle(cycle, targets.len(), loaded_at);

        let handles = targets
            .into_iter()
            .map(|(id, coin_id)| {
                let fetcher = self.fetcher.clone();
                let panel = self.panel.clone();
                tokio::spawn(async move {
                    let result = fetcher.fetch(coin_id).await;
                    let outcome = panel.lock().await.apply_enrichment(id, result);
                    match outcome {
                        PatchOutcome::Stale => warn!("Dropped price for {} from stale row", coin_id),
                        _ => debug!("Price for {}: {:?}", coin_id, outcome),
                    }
                    outcome
                })
            })
            .collect::<Vec<_>>();

        info!(
            "Sync cycle {} loaded {} favourites ({} enriching, {} unresolved)",
            cycle,
            item_count,
            handles.len(),
            unresolved
        );
        Ok(SyncOutcome {
            report: SyncReport {
                cycle,
                item_count,
                dispatched: handles.len(),
                unresolved,
                superseded: false,
                loaded_at,
            },
            enrichment: EnrichmentTasks { handles },
        })
    }
}

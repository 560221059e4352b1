// src/main.rs
mod api;
mod commands;
mod config;
mod enrichment;
mod error;
mod models;
mod mutation;
mod panel;
mod resolver;
mod sync;
#[cfg(test)]
mod testing;

use crate::api::ApiClient;
use crate::commands::{Command, HELP};
use crate::config::Config;
use crate::enrichment::EnrichmentFetcher;
use crate::error::Result;
use crate::mutation::MutationController;
use crate::panel::{Panel, SharedPanel};
use crate::sync::{EnrichmentTasks, SyncOutcome, SyncPipeline};
use clap::Parser;
use env_logger::Builder;
use log::{debug, error, info, warn};
use reqwest::Client;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Keeps the newest cycle's tasks for `wait`; older ones are detached.
fn track(outcome: Result<SyncOutcome>, pending: &mut Option<EnrichmentTasks>) {
    match outcome {
        Ok(outcome) if !outcome.report.superseded => pending.replace(outcome.enrichment),
        Ok(outcome) => {
            debug!("Cycle {} was superseded", outcome.report.cycle);
            None
        }
        Err(e) => {
            warn!("{}", e);
            None
        }
    };
}

async fn wait_for_prices(pending: &mut Option<EnrichmentTasks>) {
    if let Some(tasks) = pending.take().filter(|tasks| !tasks.is_empty()) {
        let summary = tasks.settled().await;
        info!(
            "Prices settled: {} applied, {} blank, {} stale, {} aborted",
            summary.applied, summary.empty, summary.stale, summary.aborted
        );
    }
}

async fn print_panel(panel: &SharedPanel) {
    println!("{}", panel.lock().await);
}

async fn run_once(pipeline: &SyncPipeline, panel: &SharedPanel) -> bool {
    let ok = match pipeline.run().await {
        Ok(outcome) => {
            let report = &outcome.report;
            info!(
                "Loaded {} favourites at {} ({} priced, {} without a price source)",
                report.item_count,
                report.loaded_at.format("%H:%M:%S"),
                report.dispatched,
                report.unresolved
            );
            let mut pending = Some(outcome.enrichment);
            wait_for_prices(&mut pending).await;
            true
        }
        Err(e) => {
            error!("{}", e);
            false
        }
    };
    print_panel(panel).await;
    ok
}

async fn run_interactive(
    pipeline: SyncPipeline,
    mutations: MutationController,
    panel: SharedPanel,
) -> std::io::Result<()> {
    let mut pending = None;
    // Auto-load on open.
    track(pipeline.run().await, &mut pending);
    print_panel(&panel).await;
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}\n{}", e, HELP);
                continue;
            }
        };

        match command {
            Command::Load => track(pipeline.run().await, &mut pending),
            Command::Add(symbol) => {
                if let Some(symbol) = symbol {
                    panel.lock().await.set_symbol_input(&symbol);
                }
                track(mutations.add().await, &mut pending);
            }
            Command::Remove(query) => {
                track(mutations.remove_matching(&query).await, &mut pending)
            }
            Command::User(id) => {
                panel.lock().await.set_user_input(&id);
                track(pipeline.run().await, &mut pending);
            }
            Command::Show => {}
            Command::Wait => wait_for_prices(&mut pending).await,
            Command::Help => {
                println!("{}", HELP);
                continue;
            }
            Command::Quit => break,
        }
        print_panel(&panel).await;
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config = Config::parse();
    Builder::new()
        .filter_level(config.log_level())
        .format_timestamp_secs()
        .parse_default_env()
        .init();

    let client = match Client::builder().timeout(config.timeout()).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };
    info!("Using favourites backend at {}", config.api_url);

    let panel = Panel::shared(&config.user_id);
    let api = ApiClient::new(client.clone(), &config.api_url);
    let fetcher = EnrichmentFetcher::new(client, config.info_url());
    let pipeline = SyncPipeline::new(api.clone(), fetcher, panel.clone());

    if config.once {
        if !run_once(&pipeline, &panel).await {
            std::process::exit(1);
        }
        return;
    }

    let mutations = MutationController::new(api, pipeline.clone(), panel.clone());
    if let Err(e) = run_interactive(pipeline, mutations, panel).await {
        error!("Failed to read commands: {}", e);
    }
}

// src/config.rs
use clap::Parser;
use log::LevelFilter;
use std::str::FromStr;
use std::time::Duration;

/// Terminal panel for a personal list of favourite coins with live prices.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Base URL of the favourites backend.
    #[arg(long, env = "COIN_PANEL_API_URL", default_value = "http://127.0.0.1:5000")]
    pub api_url: String,

    /// Base URL serving `/coins/{id}/external-info`. Defaults to `--api-url`.
    #[arg(long, env = "COIN_PANEL_INFO_URL")]
    pub info_url: Option<String>,

    /// Initial user id; blank means "1".
    #[arg(long, env = "COIN_PANEL_USER_ID", default_value = "1")]
    pub user_id: String,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 5)]
    pub timeout_secs: u64,

    #[arg(long, env = "COIN_PANEL_LOG", default_value = "info")]
    pub log_level: String,

    /// Sync once, wait for all prices, print the panel and exit.
    #[arg(long)]
    pub once: bool,
}

impl Config {
    pub fn info_url(&self) -> &str {
        self.info_url.as_deref().unwrap_or(&self.api_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn log_level(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Info)
    }
}

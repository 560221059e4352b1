// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown wherever a price or change value is not known.
pub const PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteItem {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FavoriteItem {
    /// Identity key: symbols compare case-insensitively.
    pub fn key(&self) -> String {
        self.symbol.trim().to_lowercase()
    }

    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ if !self.symbol.trim().is_empty() => self.symbol.trim().to_uppercase(),
            _ => "Coin".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FavoritesResponse {
    #[serde(default)]
    pub items: Vec<FavoriteItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddFavoriteRequest {
    pub symbol: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnrichmentResult {
    pub current_price_usd: Option<f64>,
    pub price_change_24h: Option<f64>,
}

impl EnrichmentResult {
    pub fn is_empty(&self) -> bool {
        self.current_price_usd.is_none() && self.price_change_24h.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExternalInfoResponse {
    #[serde(default)]
    pub data: Option<ExternalInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExternalInfo {
    #[serde(default)]
    pub current_price_usd: Option<f64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
}

impl From<ExternalInfo> for EnrichmentResult {
    fn from(info: ExternalInfo) -> Self {
        EnrichmentResult {
            current_price_usd: info.current_price_usd,
            price_change_24h: info.price_change_24h,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClass {
    Good,
    Bad,
    Neutral,
}

impl ChangeClass {
    pub fn from_change(change: Option<f64>) -> Self {
        match change {
            Some(v) if v > 0.0 => ChangeClass::Good,
            Some(v) if v < 0.0 => ChangeClass::Bad,
            _ => ChangeClass::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeClass::Good => "good",
            ChangeClass::Bad => "bad",
            ChangeClass::Neutral => "neutral",
        }
    }
}

impl fmt::Display for ChangeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a USD amount as `$65,000.50`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    // Amounts that round to zero print unsigned ("$0.00", never "-$0.00"),
    // unlike browser `Intl.NumberFormat`.
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

pub fn format_change(change: f64) -> String {
    if !change.is_finite() {
        return PLACEHOLDER.to_string();
    }
    format!("{:.2}% (24h)", change)
}

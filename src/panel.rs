// src/panel.rs
//! The rendered favourites panel: one owned view, replaced wholesale at the
//! start of every sync cycle and patched per row while prices arrive.
use crate::models::{
    format_change, format_usd, ChangeClass, EnrichmentResult, FavoriteItem, PLACEHOLDER,
};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedPanel = Arc<Mutex<Panel>>;

pub const MSG_LOADING: &str = "Loading favourites…";
pub const MSG_DONE: &str = "Done.";
pub const MSG_LOAD_FAILED: &str = "Load failed.";
pub const MSG_EMPTY_SYMBOL: &str = "Type a symbol first (btc, eth, sol).";
pub const MSG_ADDING: &str = "Adding…";
pub const MSG_ADDED: &str = "Added!";
pub const MSG_ADD_FAILED: &str = "Add failed. Check symbol / backend response.";
pub const MSG_REMOVED: &str = "Removed.";
pub const MSG_REMOVE_FAILED: &str = "Remove failed.";

/// Stable handle for a row within one sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowId {
    pub cycle: u64,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Loading,
    Rendered,
    Settled,
    Failed,
}

impl SyncPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Loading => "loading",
            SyncPhase::Rendered => "rendered",
            SyncPhase::Settled => "settled",
            SyncPhase::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Ok,
    Err,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    /// Nothing usable came back; the row keeps its placeholders.
    Empty,
    /// The row belongs to a superseded cycle.
    Stale,
}

#[derive(Debug, Clone)]
pub struct RenderRow {
    pub id: RowId,
    pub item: FavoriteItem,
    pub enrichment: Option<EnrichmentResult>,
}

impl RenderRow {
    pub fn price_text(&self) -> String {
        self.enrichment
            .and_then(|e| e.current_price_usd)
            .map(format_usd)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn change_text(&self) -> String {
        self.change()
            .map(format_change)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn change_class(&self) -> ChangeClass {
        ChangeClass::from_change(self.change())
    }

    fn change(&self) -> Option<f64> {
        self.enrichment.and_then(|e| e.price_change_24h)
    }
}

#[derive(Debug)]
pub struct Panel {
    cycle: u64,
    phase: SyncPhase,
    rows: Vec<RenderRow>,
    count: usize,
    empty_visible: bool,
    pending: usize,
    status: StatusLine,
    user_input: String,
    symbol_input: String,
    last_synced: Option<DateTime<Utc>>,
}

impl Panel {
    pub fn new(user_input: &str) -> Self {
        Panel {
            cycle: 0,
            phase: SyncPhase::Idle,
            rows: Vec::new(),
            count: 0,
            empty_visible: false,
            pending: 0,
            status: StatusLine {
                kind: StatusKind::Info,
                text: String::new(),
            },
            user_input: user_input.to_string(),
            symbol_input: String::new(),
            last_synced: None,
        }
    }

    pub fn shared(user_input: &str) -> SharedPanel {
        Arc::new(Mutex::new(Panel::new(user_input)))
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn rows(&self) -> &[RenderRow] {
        &self.rows
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn empty_visible(&self) -> bool {
        self.empty_visible
    }

    /// Enrichment tasks of the current cycle that have not reported yet.
    pub fn pending_enrichments(&self) -> usize {
        self.pending
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn set_status(&mut self, kind: StatusKind, text: &str) {
        self.status = StatusLine {
            kind,
            text: text.to_string(),
        };
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn set_user_input(&mut self, value: &str) {
        self.user_input = value.to_string();
    }

    pub fn symbol_input(&self) -> &str {
        &self.symbol_input
    }

    pub fn set_symbol_input(&mut self, value: &str) {
        self.symbol_input = value.to_string();
    }

    pub fn clear_symbol_input(&mut self) {
        self.symbol_input.clear();
    }

    /// Starts a new cycle and drops every row of the previous one.
    pub fn begin_cycle(&mut self) -> u64 {
        self.cycle += 1;
        self.phase = SyncPhase::Loading;
        self.rows.clear();
        self.pending = 0;
        self.set_status(StatusKind::Info, MSG_LOADING);
        self.cycle
    }

    /// Renders one placeholder row per item. Returns `None` when `cycle` has
    /// been superseded by a newer one.
    pub fn render_skeleton(&mut self, cycle: u64, items: Vec<FavoriteItem>) -> Option<Vec<RowId>> {
        if cycle != self.cycle {
            return None;
        }
        self.rows = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| RenderRow {
                id: RowId { cycle, index },
                item,
                enrichment: None,
            })
            .collect();
        self.count = self.rows.len();
        self.empty_visible = self.rows.is_empty();
        self.phase = SyncPhase::Rendered;
        Some(self.rows.iter().map(|row| row.id).collect())
    }

    /// Reports the list as loaded; enrichment may still be in flight.
    pub fn settle(&mut self, cycle: u64, pending: usize, at: DateTime<Utc>) -> bool {
        if cycle != self.cycle {
            return false;
        }
        self.phase = SyncPhase::Settled;
        self.pending = pending;
        self.last_synced = Some(at);
        self.set_status(StatusKind::Ok, MSG_DONE);
        true
    }

    pub fn fail(&mut self, cycle: u64) -> bool {
        if cycle != self.cycle {
            return false;
        }
        self.phase = SyncPhase::Failed;
        self.rows.clear();
        self.count = 0;
        self.empty_visible = false;
        self.pending = 0;
        self.last_synced = None;
        self.set_status(StatusKind::Err, MSG_LOAD_FAILED);
        true
    }

    pub fn apply_enrichment(&mut self, id: RowId, result: EnrichmentResult) -> PatchOutcome {
        if id.cycle != self.cycle {
            return PatchOutcome::Stale;
        }
        let Some(row) = self.rows.get_mut(id.index) else {
            return PatchOutcome::Stale;
        };
        self.pending = self.pending.saturating_sub(1);
        if result.is_empty() {
            return PatchOutcome::Empty;
        }
        row.enrichment = Some(result);
        PatchOutcome::Applied
    }

    pub fn row(&self, id: RowId) -> Option<&RenderRow> {
        if id.cycle != self.cycle {
            return None;
        }
        self.rows.get(id.index)
    }

    /// Looks a row up by 1-based position or by symbol.
    pub fn find_row(&self, query: &str) -> Option<RowId> {
        let query = query.trim();
        if let Ok(position) = query.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|index| self.rows.get(index))
                .map(|row| row.id);
        }
        let key = query.to_lowercase();
        self.rows
            .iter()
            .find(|row| row.item.key() == key)
            .map(|row| row.id)
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = self.status();
        let marker = match status.kind {
            StatusKind::Info => "..",
            StatusKind::Ok => "ok",
            StatusKind::Err => "!!",
        };
        writeln!(
            f,
            "Favourites ({})   user: {}   {} [{}] {}",
            self.count(),
            self.user_input(),
            self.phase().as_str(),
            marker,
            status.text
        )?;
        if self.empty_visible() {
            writeln!(f, "  No favourites yet. Add one with `add <symbol>`.")?;
        }
        for (position, row) in self.rows().iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {:<14} {:<6} {:>16}  {:<14} [{}]",
                position + 1,
                row.item.display_name(),
                row.item.key(),
                row.price_text(),
                row.change_text(),
                row.change_class()
            )?;
        }
        if let Some(at) = self.last_synced {
            writeln!(
                f,
                "  last synced {}, prices pending: {}",
                at.format("%H:%M:%S UTC"),
                self.pending_enrichments()
            )?;
        }
        Ok(())
    }
}

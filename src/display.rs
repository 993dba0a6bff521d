//! On-device status displays
//!
//! Pure observers of the state the router already reports. Nothing here
//! affects the telemetry frames.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::types::DeviceRole;

/// Columns of the LED bar on caching nodes.
pub const LED_COLUMNS: usize = 32;

/// Receives status updates from the router and the channel gate.
pub trait StatusDisplay: Send + Sync {
    /// Routing rank changed; `timed_out` when the parent was just dropped.
    fn show_rank(&self, _rank: Option<u16>, _timed_out: bool) {}

    /// Name cache occupancy changed.
    fn show_cache(&self, _occupied: usize, _capacity: usize) {}

    /// Radio channel changed.
    fn show_channel(&self, _channel: u16) {}
}

/// Display that shows nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl StatusDisplay for NullDisplay {}

/// The display a role comes with.
pub fn for_role(role: DeviceRole) -> Arc<dyn StatusDisplay> {
    if role.uses_text_panel() {
        Arc::new(TextPanel::default())
    } else {
        Arc::new(LedBar::default())
    }
}

fn two_digits(value: Option<u16>) -> String {
    match value {
        Some(value) => format!("{value:2}"),
        None => "XX".to_string(),
    }
}

/// Lines of a small text panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelLines {
    /// Parent marker: blank, or `TO` after a parent timeout.
    pub marker: String,
    /// `R:<rank>`
    pub rank: String,
    /// `C:<channel>`
    pub channel: String,
    /// `N:<names>`
    pub names: String,
}

/// Text panel used on originators and sensor gates.
#[derive(Debug, Default)]
pub struct TextPanel {
    lines: Mutex<PanelLines>,
}

impl TextPanel {
    pub fn lines(&self) -> PanelLines {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update(&self, f: impl FnOnce(&mut PanelLines)) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut lines);
        debug!(?lines, "Panel updated");
    }
}

impl StatusDisplay for TextPanel {
    fn show_rank(&self, rank: Option<u16>, timed_out: bool) {
        self.update(|lines| {
            lines.marker = if timed_out { "TO".into() } else { "  ".into() };
            lines.rank = format!("R:{}", two_digits(rank));
        });
    }

    fn show_cache(&self, occupied: usize, _capacity: usize) {
        let occupied = u16::try_from(occupied).unwrap_or(u16::MAX);
        self.update(|lines| lines.names = format!("N:{}", two_digits(Some(occupied))));
    }

    fn show_channel(&self, channel: u16) {
        self.update(|lines| lines.channel = format!("C:{}", two_digits(Some(channel))));
    }
}

/// LED bar lighting two columns per cached name.
///
/// Counts that would not fit leave the bar unchanged.
#[derive(Debug, Default)]
pub struct LedBar {
    columns: Mutex<[bool; LED_COLUMNS]>,
}

impl LedBar {
    pub fn columns(&self) -> [bool; LED_COLUMNS] {
        *self.columns.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lit(&self) -> usize {
        self.columns().iter().filter(|lit| **lit).count()
    }
}

impl StatusDisplay for LedBar {
    fn show_cache(&self, occupied: usize, _capacity: usize) {
        let lit = occupied.saturating_mul(2);
        if lit >= LED_COLUMNS {
            return;
        }
        let mut columns = self.columns.lock().unwrap_or_else(PoisonError::into_inner);
        for (i, column) in columns.iter_mut().enumerate() {
            *column = i < lit;
        }
    }
}

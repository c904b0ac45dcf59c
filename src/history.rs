//! Play history ledger
//!
//! Persisted to LocalStorage, keeps the most recent completed plays.

use serde::{Deserialize, Serialize};

use crate::outcome::{GameKind, Outcome};
use crate::sim::BackendKind;

/// Maximum number of plays to keep
pub const MAX_PLAY_RECORDS: usize = 50;

/// One completed play
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub kind: GameKind,
    pub outcome: Outcome,
    /// Credits paid
    pub reward: u32,
    /// Final frame was corrected onto the target
    pub snapped: bool,
    /// Tick ceiling had to settle the play
    pub forced: bool,
    /// Simulation ticks (zero for the scratch card)
    pub ticks: u64,
    /// None for the scratch card
    pub backend: Option<BackendKind>,
    /// Engine-local play number
    pub sequence: u64,
}

/// Recent plays, newest first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlayHistory {
    pub entries: Vec<PlayRecord>,
}

impl PlayHistory {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "chance_rig_history";

    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a play, dropping the oldest past the limit
    pub fn record(&mut self, record: PlayRecord) {
        self.entries.insert(0, record);
        self.entries.truncate(MAX_PLAY_RECORDS);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&PlayRecord> {
        self.entries.first()
    }

    /// Credits paid across the kept plays
    pub fn total_reward(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.reward)).sum()
    }

    /// Largest single payout (if any)
    pub fn best_reward(&self) -> Option<u32> {
        self.entries.iter().map(|e| e.reward).max()
    }

    /// Share of kept plays that needed a snap
    pub fn snap_rate(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let snapped = self.entries.iter().filter(|e| e.snapped).count();
        snapped as f32 / self.entries.len() as f32
    }

    /// Load history from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(history) = serde_json::from_str::<PlayHistory>(&json) {
                    log::info!("Loaded {} play records", history.entries.len());
                    return history;
                }
            }
        }

        log::info!("No play history found, starting fresh");
        Self::new()
    }

    /// Save history to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::debug!("Play history saved ({} entries)", self.entries.len());
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheel(reward: u32, sequence: u64, snapped: bool) -> PlayRecord {
        PlayRecord {
            kind: GameKind::Wheel,
            outcome: Outcome::Wheel { segment_index: 0 },
            reward,
            snapped,
            forced: false,
            ticks: 200,
            backend: Some(BackendKind::Rigid),
            sequence,
        }
    }

    #[test]
    fn test_newest_first_and_bounded() {
        let mut history = PlayHistory::new();
        for i in 0..(MAX_PLAY_RECORDS as u64 + 5) {
            history.record(wheel(1, i, false));
        }
        assert_eq!(history.len(), MAX_PLAY_RECORDS);
        assert_eq!(history.latest().map(|r| r.sequence), Some(54));
        assert_eq!(history.entries.last().map(|r| r.sequence), Some(5));
    }

    #[test]
    fn test_totals() {
        let mut history = PlayHistory::new();
        assert_eq!(history.best_reward(), None);
        assert_eq!(history.snap_rate(), 0.0);
        history.record(wheel(3, 0, false));
        history.record(wheel(10, 1, true));
        history.record(wheel(0, 2, false));
        assert_eq!(history.total_reward(), 13);
        assert_eq!(history.best_reward(), Some(10));
        assert!((history.snap_rate() - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_json_roundtrip_keeps_records() {
        let mut history = PlayHistory::new();
        history.record(wheel(2, 7, true));
        let json = serde_json::to_string(&history).unwrap();
        let restored: PlayHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.entries, history.entries);
    }
}

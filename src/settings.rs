//! Engine settings and preferences
//!
//! Persisted separately from the play history in LocalStorage.

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::sim::BackendKind;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Whether the preset allows the rigid-body (3D) backend at all
    pub fn allows_rigid(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// How launch state is derived from the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LaunchMode {
    /// Biased but randomized initial kinematics
    #[default]
    Randomized,
    /// Zero randomness: bodies start at their terminal transform with zero velocity
    Exact,
}

/// Engine settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Force one backend regardless of the capability probe
    pub backend_override: Option<BackendKind>,
    pub launch_mode: LaunchMode,

    // === Simulation ===
    /// Fixed simulation timestep (seconds)
    pub sim_dt: f32,
    /// Maximum substeps per frame
    pub max_substeps: u32,
    /// Ticks after which every body is force-settled
    pub tick_ceiling: u64,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion: bodies start at rest on their result
    pub reduced_motion: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            backend_override: None,
            launch_mode: LaunchMode::Randomized,

            sim_dt: consts::SIM_DT,
            max_substeps: consts::MAX_SUBSTEPS,
            tick_ceiling: consts::DEFAULT_TICK_CEILING,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,

            reduced_motion: false,
        }
    }
}

impl EngineSettings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Zero-randomness settings used to check extraction independent of physics
    pub fn exact() -> Self {
        Self {
            launch_mode: LaunchMode::Exact,
            ..Self::default()
        }
    }

    /// Multiplier applied to every cue's base volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Launch mode after accessibility preferences
    pub fn effective_launch_mode(&self) -> LaunchMode {
        if self.reduced_motion {
            LaunchMode::Exact
        } else {
            self.launch_mode
        }
    }

    /// Timestep actually used by the loop (guards against zero/negative config)
    pub fn effective_dt(&self) -> f32 {
        if self.sim_dt > 0.0 {
            self.sim_dt
        } else {
            consts::SIM_DT
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "chance_rig_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded engine settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default engine settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Engine settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

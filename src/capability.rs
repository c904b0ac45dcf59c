//! Capability gate: picks the rigid-body or planar backend
//!
//! Evaluated once per engine. The probe is fail-safe: any probe error is
//! treated as "no 3D support" and the planar backend is used.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::EngineSettings;
use crate::sim::BackendKind;

/// Devices with this many hardware threads or fewer count as low-end
const LOW_END_THREADS: u32 = 2;

/// What the host reports about the device
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// A GPU API capable of the 3D scene is available
    pub webgl2: bool,
    pub mobile: bool,
    pub hardware_concurrency: u32,
    pub device_pixel_ratio: f32,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            webgl2: true,
            mobile: false,
            hardware_concurrency: 4,
            device_pixel_ratio: 1.0,
        }
    }
}

impl Capabilities {
    pub fn is_low_end(&self) -> bool {
        self.mobile && self.hardware_concurrency <= LOW_END_THREADS
    }

    pub fn supports_rigid(&self) -> bool {
        self.webgl2 && !self.is_low_end()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeError {
    #[error("no browser window")]
    NoWindow,
    #[error("capability probe failed: {0}")]
    Failed(String),
}

/// Phones and tablets by user-agent string
pub fn is_mobile_user_agent(agent: &str) -> bool {
    ["Mobi", "Android", "iPhone", "iPad", "iPod"]
        .iter()
        .any(|marker| agent.contains(marker))
}

/// Source of device capabilities
pub trait CapabilityProbe {
    fn probe(&self) -> Result<Capabilities, ProbeError>;
}

/// Fixed answer, for native hosts and tests
#[derive(Debug, Clone)]
pub struct StaticProbe(pub Result<Capabilities, ProbeError>);

impl StaticProbe {
    pub fn capable() -> Self {
        Self(Ok(Capabilities::default()))
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self(Err(ProbeError::Failed(reason.into())))
    }
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self::capable()
    }
}

impl CapabilityProbe for StaticProbe {
    fn probe(&self) -> Result<Capabilities, ProbeError> {
        self.0.clone()
    }
}

/// Choose the backend for one engine instance
pub fn select_backend(probe: &dyn CapabilityProbe, settings: &EngineSettings) -> BackendKind {
    if let Some(kind) = settings.backend_override {
        log::info!("Backend forced to {kind} by settings");
        return kind;
    }
    if !settings.quality.allows_rigid() {
        log::info!("{} quality preset: using planar backend", settings.quality.as_str());
        return BackendKind::Planar;
    }
    match probe.probe() {
        Ok(caps) if caps.supports_rigid() => BackendKind::Rigid,
        Ok(caps) => {
            log::info!("Device lacks 3D support ({caps:?}); using planar backend");
            BackendKind::Planar
        }
        Err(err) => {
            log::warn!("{err}; falling back to planar backend");
            BackendKind::Planar
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;

    #[test]
    fn test_capable_device_gets_rigid() {
        let settings = EngineSettings::default();
        assert_eq!(select_backend(&StaticProbe::capable(), &settings), BackendKind::Rigid);
    }

    #[test]
    fn test_probe_failure_is_fail_safe() {
        let settings = EngineSettings::default();
        assert_eq!(
            select_backend(&StaticProbe::failing("context lost"), &settings),
            BackendKind::Planar
        );
        assert_eq!(
            select_backend(&StaticProbe(Err(ProbeError::NoWindow)), &settings),
            BackendKind::Planar
        );
    }

    #[test]
    fn test_low_end_and_no_gpu() {
        let settings = EngineSettings::default();
        let phone = Capabilities {
            mobile: true,
            hardware_concurrency: 2,
            ..Capabilities::default()
        };
        assert!(phone.is_low_end());
        assert_eq!(select_backend(&StaticProbe(Ok(phone)), &settings), BackendKind::Planar);

        let no_gpu = Capabilities {
            webgl2: false,
            ..Capabilities::default()
        };
        assert_eq!(select_backend(&StaticProbe(Ok(no_gpu)), &settings), BackendKind::Planar);

        // A mobile device with enough cores keeps 3D
        let tablet = Capabilities {
            mobile: true,
            hardware_concurrency: 8,
            ..Capabilities::default()
        };
        assert!(tablet.supports_rigid());
    }

    #[test]
    fn test_mobile_user_agents() {
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15"
        ));
        assert!(is_mobile_user_agent(
            "Mozilla/5.0 (Linux; Android 14; Pixel 8) Chrome/120.0 Mobile Safari/537.36"
        ));
        assert!(!is_mobile_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0"
        ));
    }

    #[test]
    fn test_settings_take_precedence() {
        let low = EngineSettings::from_preset(QualityPreset::Low);
        assert_eq!(select_backend(&StaticProbe::capable(), &low), BackendKind::Planar);

        let forced = EngineSettings {
            backend_override: Some(BackendKind::Rigid),
            ..EngineSettings::default()
        };
        assert_eq!(
            select_backend(&StaticProbe::failing("ignored"), &forced),
            BackendKind::Rigid
        );
    }
}

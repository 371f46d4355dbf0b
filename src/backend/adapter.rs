//! Adapter enumeration and selection.

use crate::errors::{Result, RhiError};
use crate::settings::AdapterPreference;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterInfo {
    pub name: String,
    pub vendor_id: u32,
    pub dedicated_video_memory: u64,
    pub integrated: bool,
}

/// Adapters exposed by the headless device layer.
#[must_use]
pub fn enumerate_adapters() -> Vec<AdapterInfo> {
    vec![
        AdapterInfo {
            name: "Myth Headless Discrete".to_string(),
            vendor_id: 0x4D59,
            dedicated_video_memory: 8 << 30,
            integrated: false,
        },
        AdapterInfo {
            name: "Myth Headless Integrated".to_string(),
            vendor_id: 0x4D59,
            dedicated_video_memory: 512 << 20,
            integrated: true,
        },
    ]
}

/// Picks the adapter that best matches `preference`.
///
/// High performance prefers the largest dedicated memory on a discrete part;
/// low power prefers an integrated part. Falls back to whatever exists.
pub fn select_adapter(adapters: &[AdapterInfo], preference: AdapterPreference) -> Result<AdapterInfo> {
    let wants_integrated = preference == AdapterPreference::LowPower;
    adapters
        .iter()
        .max_by_key(|a| (a.integrated == wants_integrated, a.dedicated_video_memory))
        .cloned()
        .ok_or_else(|| RhiError::creation("device", "no compatible adapter found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference() {
        let adapters = enumerate_adapters();
        let fast = select_adapter(&adapters, AdapterPreference::HighPerformance).unwrap();
        assert!(!fast.integrated);
        let low = select_adapter(&adapters, AdapterPreference::LowPower).unwrap();
        assert!(low.integrated);
    }

    #[test]
    fn test_fallback_when_preferred_missing() {
        let adapters: Vec<_> = enumerate_adapters().into_iter().filter(|a| !a.integrated).collect();
        let chosen = select_adapter(&adapters, AdapterPreference::LowPower).unwrap();
        assert!(!chosen.integrated);
    }

    #[test]
    fn test_no_adapters() {
        assert!(select_adapter(&[], AdapterPreference::HighPerformance).is_err());
    }
}

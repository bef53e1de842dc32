use serde::{Deserialize, Serialize};

/// Default TTL while the market session is open, in seconds.
pub const DEFAULT_TRADING_HOURS_TTL_S: u32 = 300;

/// Fixed after-hours TTL when dynamic expiry is not requested, in seconds.
pub const AFTER_HOURS_FIXED_TTL_S: u32 = 3600;

/// Default TTL for periodic releases (7 days), in seconds.
pub const DEFAULT_PERIODIC_TTL_S: u32 = 604_800;

/// Default TTL for static data (1 day), in seconds.
pub const DEFAULT_STATIC_TTL_S: u32 = 86_400;

/// Floor for dynamically computed TTLs, in seconds.
pub const MIN_DYNAMIC_TTL_S: u32 = 60;

/// Default jitter applied by the fallback descriptor, in percent.
pub const DEFAULT_JITTER_PCT: u8 = 10;

/// A tool's declared data-freshness category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolLifecycle {
    /// Changes tick-by-tick while the market session is open.
    Realtime,
    /// Valid for the rest of the local trading day.
    Intraday,
    /// Refreshed on a multi-day release schedule.
    Periodic,
    /// Rarely changes.
    #[default]
    Static,
    /// Invalidated by external events rather than time.
    EventDriven,
}

/// How a realtime tool's cache behaves outside the market session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterHoursMode {
    /// A fixed long TTL after the session closes.
    Fixed,
    /// The cache expires right as the next session opens.
    DynamicUntilOpen,
}

/// Static per-tool freshness policy.
///
/// Loaded once per tool from the lifecycle registry and immutable for the
/// process lifetime. Unset fields fall back to the lifecycle's default
/// constants at calculation time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLifecycleDescriptor {
    /// The freshness category driving the TTL rule.
    pub lifecycle: ToolLifecycle,

    /// TTL while the market session is open (realtime tools).
    #[serde(default)]
    pub trading_hours_ttl_s: Option<u32>,

    /// After-hours behavior (realtime tools). Unset means fixed.
    #[serde(default)]
    pub after_hours_mode: Option<AfterHoursMode>,

    /// Explicit static TTL; overrides the per-lifecycle default.
    #[serde(default)]
    pub static_ttl_s: Option<u32>,

    /// Random perturbation applied to the final TTL, in percent.
    #[serde(default)]
    pub jitter_pct: u8,
}

impl Default for ToolLifecycleDescriptor {
    /// The documented fallback for unknown tools: static, 1-day TTL,
    /// 10% jitter.
    fn default() -> Self {
        Self {
            lifecycle: ToolLifecycle::Static,
            trading_hours_ttl_s: None,
            after_hours_mode: None,
            static_ttl_s: Some(DEFAULT_STATIC_TTL_S),
            jitter_pct: DEFAULT_JITTER_PCT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_deserializes_snake_case() {
        let descriptor: ToolLifecycleDescriptor = serde_json::from_str(
            r#"{
                "lifecycle": "realtime",
                "trading_hours_ttl_s": 120,
                "after_hours_mode": "dynamic_until_open",
                "jitter_pct": 5
            }"#,
        )
        .unwrap();

        assert_eq!(descriptor.lifecycle, ToolLifecycle::Realtime);
        assert_eq!(descriptor.trading_hours_ttl_s, Some(120));
        assert_eq!(
            descriptor.after_hours_mode,
            Some(AfterHoursMode::DynamicUntilOpen)
        );
        assert_eq!(descriptor.static_ttl_s, None);
        assert_eq!(descriptor.jitter_pct, 5);
    }

    #[test]
    fn test_default_descriptor_is_static_one_day() {
        let descriptor = ToolLifecycleDescriptor::default();
        assert_eq!(descriptor.lifecycle, ToolLifecycle::Static);
        assert_eq!(descriptor.static_ttl_s, Some(DEFAULT_STATIC_TTL_S));
        assert_eq!(descriptor.jitter_pct, DEFAULT_JITTER_PCT);
    }

    #[test]
    fn test_event_driven_round_trips() {
        let descriptor = ToolLifecycleDescriptor {
            lifecycle: ToolLifecycle::EventDriven,
            ..Default::default()
        };
        let json = serde_json::to_string(&descriptor).unwrap();
        assert!(json.contains("event_driven"));
        let back: ToolLifecycleDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, descriptor);
    }
}

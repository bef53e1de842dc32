//! Market-session-aware TTL calculation.
//!
//! Computes how long a cached answer for a tool remains valid, driven by
//! the tool's lifecycle descriptor. Realtime tools expire fast during the
//! trading session and can be pinned to the next session open outside it;
//! jitter desynchronizes mass cache expiry so upstream providers don't get
//! hammered by a thundering herd when many entries were written together.
//!
//! The calculator is deterministic given an injected `now` and a seeded
//! random source.

use std::sync::Mutex;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, NaiveTime, Utc, Weekday};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::descriptor::{
    AfterHoursMode, ToolLifecycle, ToolLifecycleDescriptor, AFTER_HOURS_FIXED_TTL_S,
    DEFAULT_PERIODIC_TTL_S, DEFAULT_STATIC_TTL_S, DEFAULT_TRADING_HOURS_TTL_S, MIN_DYNAMIC_TTL_S,
};

use crate::registry::LifecycleRegistry;

/// A market's daily trading session in its local timezone.
#[derive(Clone, Debug)]
pub struct MarketSession {
    /// Session open, local time-of-day.
    pub open: NaiveTime,
    /// Session close, local time-of-day (inclusive).
    pub close: NaiveTime,
    /// The market's UTC offset.
    pub utc_offset: FixedOffset,
}

impl Default for MarketSession {
    /// The Taiwan session: 09:00-13:30, UTC+8, weekends closed.
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time"),
            close: NaiveTime::from_hms_opt(13, 30, 0).expect("13:30 is a valid time"),
            utc_offset: FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset"),
        }
    }
}

impl MarketSession {
    /// Whether the local timestamp falls inside the trading session.
    /// Weekends are always closed.
    pub fn is_trading(&self, local: NaiveDateTime) -> bool {
        if is_weekend(local.weekday()) {
            return false;
        }
        let t = local.time();
        self.open <= t && t <= self.close
    }

    /// The next session open strictly after business has moved past
    /// today's open: if the local time-of-day is already past the open,
    /// advance to the next calendar day, then skip weekend days.
    pub fn next_open(&self, local: NaiveDateTime) -> NaiveDateTime {
        let mut day = local.date();
        if local.time() >= self.open {
            day = day.succ_opt().expect("date within supported range");
        }
        while is_weekend(day.weekday()) {
            day = day.succ_opt().expect("date within supported range");
        }
        day.and_time(self.open)
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Session-aware TTL calculator.
///
/// Stateless apart from the seedable random source used for jitter; safe
/// to share across threads.
pub struct TtlCalculator {
    session: MarketSession,
    rng: Mutex<StdRng>,
}

impl TtlCalculator {
    /// Calculator for the default session with entropy-seeded jitter.
    pub fn new() -> Self {
        Self::with_config(MarketSession::default(), None)
    }

    /// Calculator with an explicit session and optional jitter seed.
    ///
    /// Pass a seed in tests to make jittered TTLs reproducible.
    pub fn with_config(session: MarketSession, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            session,
            rng: Mutex::new(rng),
        }
    }

    /// Compute the TTL in seconds for a descriptor at `now`.
    ///
    /// Always returns at least 1. Deterministic given `now` and the seed.
    pub fn ttl_seconds(&self, descriptor: &ToolLifecycleDescriptor, now: DateTime<Utc>) -> u64 {
        let local = now.with_timezone(&self.session.utc_offset).naive_local();

        let base: i64 = match descriptor.lifecycle {
            ToolLifecycle::Realtime => {
                if self.session.is_trading(local) {
                    i64::from(
                        descriptor
                            .trading_hours_ttl_s
                            .unwrap_or(DEFAULT_TRADING_HOURS_TTL_S),
                    )
                } else if descriptor.after_hours_mode == Some(AfterHoursMode::DynamicUntilOpen) {
                    let next_open = self.session.next_open(local);
                    let until_open = (next_open - local).num_seconds();
                    until_open.max(i64::from(MIN_DYNAMIC_TTL_S))
                } else {
                    i64::from(AFTER_HOURS_FIXED_TTL_S)
                }
            }
            ToolLifecycle::Intraday => match descriptor.static_ttl_s {
                Some(ttl) => i64::from(ttl),
                None => {
                    let end_of_day = local
                        .date()
                        .and_time(NaiveTime::from_hms_opt(23, 59, 59).expect("valid time"));
                    (end_of_day - local)
                        .num_seconds()
                        .max(i64::from(MIN_DYNAMIC_TTL_S))
                }
            },
            ToolLifecycle::Periodic => i64::from(
                descriptor.static_ttl_s.unwrap_or(DEFAULT_PERIODIC_TTL_S),
            ),
            ToolLifecycle::Static | ToolLifecycle::EventDriven => i64::from(
                descriptor.static_ttl_s.unwrap_or(DEFAULT_STATIC_TTL_S),
            ),
        };

        let jittered = self.apply_jitter(base, descriptor.jitter_pct);
        let ttl = jittered.max(1) as u64;

        debug!(
            "TTL for {:?} at {}: base {}s, final {}s",
            descriptor.lifecycle, now, base, ttl
        );
        ttl
    }

    /// TTL for a named tool via its registry descriptor.
    pub fn ttl_for_tool(
        &self,
        registry: &LifecycleRegistry,
        tool_name: &str,
        now: DateTime<Utc>,
    ) -> u64 {
        self.ttl_seconds(registry.get_descriptor(tool_name), now)
    }

    /// Perturb `base` by up to ± `jitter_pct` percent, uniformly.
    fn apply_jitter(&self, base: i64, jitter_pct: u8) -> i64 {
        if jitter_pct == 0 {
            return base;
        }
        let range = base * i64::from(jitter_pct) / 100;
        if range <= 0 {
            return base;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        base + rng.gen_range(-range..=range)
    }
}

impl Default for TtlCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DEFAULT_JITTER_PCT;
    use chrono::TimeZone;

    fn descriptor(lifecycle: ToolLifecycle) -> ToolLifecycleDescriptor {
        ToolLifecycleDescriptor {
            lifecycle,
            trading_hours_ttl_s: None,
            after_hours_mode: None,
            static_ttl_s: None,
            jitter_pct: 0,
        }
    }

    fn realtime_dynamic() -> ToolLifecycleDescriptor {
        ToolLifecycleDescriptor {
            after_hours_mode: Some(AfterHoursMode::DynamicUntilOpen),
            ..descriptor(ToolLifecycle::Realtime)
        }
    }

    fn calc() -> TtlCalculator {
        TtlCalculator::with_config(MarketSession::default(), Some(42))
    }

    /// 2024-01-10 is a Wednesday; 02:00 UTC is 10:00 UTC+8, mid-session.
    fn wednesday_in_session() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 2, 0, 0).unwrap()
    }

    #[test]
    fn test_realtime_during_session_uses_trading_ttl() {
        let ttl = calc().ttl_seconds(&realtime_dynamic(), wednesday_in_session());
        assert_eq!(ttl, u64::from(DEFAULT_TRADING_HOURS_TTL_S));
    }

    #[test]
    fn test_realtime_explicit_trading_ttl() {
        let mut descriptor = realtime_dynamic();
        descriptor.trading_hours_ttl_s = Some(120);
        let ttl = calc().ttl_seconds(&descriptor, wednesday_in_session());
        assert_eq!(ttl, 120);
    }

    #[test]
    fn test_session_close_is_inclusive() {
        // 05:30 UTC = 13:30 UTC+8, the last in-session second
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 5, 30, 0).unwrap();
        let ttl = calc().ttl_seconds(&realtime_dynamic(), now);
        assert_eq!(ttl, u64::from(DEFAULT_TRADING_HOURS_TTL_S));
    }

    #[test]
    fn test_realtime_after_close_counts_down_to_next_open() {
        // Wednesday 14:00 local -> Thursday 09:00 local = 19h
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap();
        let ttl = calc().ttl_seconds(&realtime_dynamic(), now);
        assert_eq!(ttl, 19 * 3600);
    }

    #[test]
    fn test_friday_after_close_skips_weekend() {
        // Friday 2024-01-12 14:00 local -> Monday 09:00 local = 67h
        let now = Utc.with_ymd_and_hms(2024, 1, 12, 6, 0, 0).unwrap();
        let ttl = calc().ttl_seconds(&realtime_dynamic(), now);
        assert_eq!(ttl, 67 * 3600);
    }

    #[test]
    fn test_saturday_targets_monday_open() {
        // Saturday 2024-01-13 10:00 local -> Monday 09:00 local = 47h
        let now = Utc.with_ymd_and_hms(2024, 1, 13, 2, 0, 0).unwrap();
        let ttl = calc().ttl_seconds(&realtime_dynamic(), now);
        assert_eq!(ttl, 47 * 3600);
    }

    #[test]
    fn test_dynamic_ttl_floors_at_sixty_seconds() {
        // Wednesday 08:59:30 local, 30s before the open
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 0, 59, 30).unwrap();
        let ttl = calc().ttl_seconds(&realtime_dynamic(), now);
        assert_eq!(ttl, u64::from(MIN_DYNAMIC_TTL_S));
    }

    #[test]
    fn test_realtime_fixed_after_hours() {
        let mut descriptor = descriptor(ToolLifecycle::Realtime);
        descriptor.after_hours_mode = Some(AfterHoursMode::Fixed);
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 6, 0, 0).unwrap();
        assert_eq!(
            calc().ttl_seconds(&descriptor, now),
            u64::from(AFTER_HOURS_FIXED_TTL_S)
        );

        // Unset mode behaves like fixed
        descriptor.after_hours_mode = None;
        assert_eq!(
            calc().ttl_seconds(&descriptor, now),
            u64::from(AFTER_HOURS_FIXED_TTL_S)
        );
    }

    #[test]
    fn test_intraday_expires_at_end_of_day() {
        // 23:00 local -> 3599s to 23:59:59
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap();
        let ttl = calc().ttl_seconds(&descriptor(ToolLifecycle::Intraday), now);
        assert_eq!(ttl, 3599);
    }

    #[test]
    fn test_intraday_explicit_ttl_overrides() {
        let mut descriptor = descriptor(ToolLifecycle::Intraday);
        descriptor.static_ttl_s = Some(1800);
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 15, 0, 0).unwrap();
        assert_eq!(calc().ttl_seconds(&descriptor, now), 1800);
    }

    #[test]
    fn test_periodic_defaults_to_seven_days() {
        let ttl = calc().ttl_seconds(&descriptor(ToolLifecycle::Periodic), wednesday_in_session());
        assert_eq!(ttl, u64::from(DEFAULT_PERIODIC_TTL_S));
    }

    #[test]
    fn test_static_and_event_driven_default_to_one_day() {
        let now = wednesday_in_session();
        assert_eq!(
            calc().ttl_seconds(&descriptor(ToolLifecycle::Static), now),
            u64::from(DEFAULT_STATIC_TTL_S)
        );
        assert_eq!(
            calc().ttl_seconds(&descriptor(ToolLifecycle::EventDriven), now),
            u64::from(DEFAULT_STATIC_TTL_S)
        );
    }

    #[test]
    fn test_jitter_stays_in_bounds_and_is_seeded() {
        let mut with_jitter = descriptor(ToolLifecycle::Static);
        with_jitter.static_ttl_s = Some(1000);
        with_jitter.jitter_pct = 10;
        let now = wednesday_in_session();

        let a = TtlCalculator::with_config(MarketSession::default(), Some(7))
            .ttl_seconds(&with_jitter, now);
        let b = TtlCalculator::with_config(MarketSession::default(), Some(7))
            .ttl_seconds(&with_jitter, now);

        assert_eq!(a, b);
        assert!((900..=1100).contains(&a));
    }

    #[test]
    fn test_jitter_never_drives_ttl_nonpositive() {
        let mut tiny = descriptor(ToolLifecycle::Static);
        tiny.static_ttl_s = Some(1);
        tiny.jitter_pct = 90;

        let ttl = calc().ttl_seconds(&tiny, wednesday_in_session());
        assert_eq!(ttl, 1);
    }

    #[test]
    fn test_ttl_for_tool_reads_registry() {
        let registry = LifecycleRegistry::new(std::collections::HashMap::new());
        let ttl = calc().ttl_for_tool(&registry, "unknown_tool", wednesday_in_session());

        // Default descriptor: one day with 10% jitter
        let base = u64::from(DEFAULT_STATIC_TTL_S);
        let spread = base * u64::from(DEFAULT_JITTER_PCT) / 100;
        assert!((base - spread..=base + spread).contains(&ttl));
    }
}

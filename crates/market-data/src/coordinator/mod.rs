//! Waterfall price verification coordinator.
//!
//! The coordinator orchestrates configured price sources, handling:
//! - Waterfall fallback in fixed priority order (highest trust first)
//! - Nearest-prior-trading-day fallback for non-trading dates
//! - Advisory cross-checks of the accepted row against a secondary source
//! - Circuit breaking so degraded providers are skipped without waiting
//!   for fresh timeouts on every request
//!
//! The output is a [`PriceProof`]: either an accepted row plus the audit
//! trail of how it was obtained, or a fully-formed failure that explains
//! through its warnings why every source came up empty. Provider failures
//! never escape this module; the only error a caller ever sees is input
//! validation.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use log::{debug, info, warn};
use rust_decimal::prelude::ToPrimitive;

use crate::errors::{PriceDataError, RetryClass};
use crate::models::{
    latest_on_or_before, CanonicalSymbol, CrossCheckResult, PriceProof, PriceRow,
};
use crate::provider::{PriceDataProvider, SymbolForm};
use crate::registry::CircuitBreaker;
use crate::resolver::normalize;

/// Default query window behind the as-of date, in days.
///
/// Wide enough to bridge weekends plus a holiday cluster.
const DEFAULT_LOOKBACK_DAYS: u32 = 5;

/// Relative close difference above which a cross-check is a mismatch.
const DEFAULT_CROSS_CHECK_TOLERANCE: f64 = 0.005;

/// Window for the last-resort sweep when the requested date is outside
/// any provider's coverage.
const WIDE_WINDOW_DAYS: u32 = 365;

/// How many of the highest-trust providers join the last-resort sweep.
const WIDE_WINDOW_PROVIDERS: usize = 2;

/// Coordinator tuning knobs.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Days behind the as-of date covered by the normal query window.
    pub lookback_days: u32,
    /// Cross-check tolerance on the relative close difference.
    pub cross_check_tolerance: f64,
    /// Days covered by the last-resort window.
    pub wide_window_days: u32,
    /// Number of highest-trust providers retried in the last resort.
    pub wide_window_providers: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            cross_check_tolerance: DEFAULT_CROSS_CHECK_TOLERANCE,
            wide_window_days: WIDE_WINDOW_DAYS,
            wide_window_providers: WIDE_WINDOW_PROVIDERS,
        }
    }
}

/// Multi-source price verification coordinator.
///
/// Holds the configured providers sorted by priority (lower value = higher
/// trust, tried first) and one shared [`CircuitBreaker`] keyed by provider
/// id. The waterfall is strictly sequential per request; concurrent
/// requests are independent and share only the breaker state.
pub struct PriceProofCoordinator {
    providers: Vec<Arc<dyn PriceDataProvider>>,
    circuit_breaker: CircuitBreaker,
    config: CoordinatorConfig,
}

impl PriceProofCoordinator {
    /// Create a coordinator with default configuration.
    pub fn new(providers: Vec<Arc<dyn PriceDataProvider>>) -> Self {
        Self::with_config(providers, CoordinatorConfig::default(), CircuitBreaker::new())
    }

    /// Create a coordinator with custom configuration and breaker.
    pub fn with_config(
        mut providers: Vec<Arc<dyn PriceDataProvider>>,
        config: CoordinatorConfig,
        circuit_breaker: CircuitBreaker,
    ) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self {
            providers,
            circuit_breaker,
            config,
        }
    }

    /// The shared circuit breaker guarding this coordinator's providers.
    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// The providers in waterfall order.
    pub fn providers(&self) -> &[Arc<dyn PriceDataProvider>] {
        &self.providers
    }

    /// Fetch a verified price for `symbol` as of `as_of`.
    ///
    /// See [`get_verified_price_with_lookback`](Self::get_verified_price_with_lookback).
    pub async fn get_verified_price(
        &self,
        symbol: &str,
        as_of: NaiveDate,
    ) -> Result<PriceProof, PriceDataError> {
        self.get_verified_price_with_lookback(symbol, as_of, self.config.lookback_days)
            .await
    }

    /// Fetch a verified price with an explicit lookback window.
    ///
    /// Tries providers in priority order, accepting the most recent row on
    /// or before `as_of` within `[as_of - lookback_days, as_of]`, then
    /// cross-checks the accepted row against one lower-priority source.
    /// Exhaustion falls back to a much wider window on the highest-trust
    /// providers before a failure proof is returned.
    ///
    /// The only error is input validation (blank symbol); every provider
    /// failure is absorbed into the proof's warnings.
    pub async fn get_verified_price_with_lookback(
        &self,
        symbol: &str,
        as_of: NaiveDate,
        lookback_days: u32,
    ) -> Result<PriceProof, PriceDataError> {
        if symbol.trim().is_empty() {
            return Err(PriceDataError::InvalidInput {
                message: "symbol must not be empty".to_string(),
            });
        }

        let canonical = normalize(symbol);
        let from = as_of - Duration::days(i64::from(lookback_days));
        let mut warnings: Vec<String> = Vec::new();

        debug!(
            "Fetching {} (yahoo: {}) for {} (window {} ~ {})",
            canonical.id,
            canonical.yahoo_symbol(),
            as_of,
            from,
            as_of
        );

        for (index, provider) in self.providers.iter().enumerate() {
            let provider_id = provider.id();

            if !self.circuit_breaker.is_allowed(provider_id) {
                debug!("Circuit breaker open for '{}', skipping", provider_id);
                warnings.push(format!("{provider_id}: skipped, circuit breaker open"));
                continue;
            }

            let symbol_id = self.symbol_for(provider.as_ref(), &canonical);

            match provider.fetch(&symbol_id, from, as_of).await {
                Ok(rows) => {
                    self.circuit_breaker.record_success(provider_id);

                    let mut chosen = latest_on_or_before(&rows, as_of).cloned();

                    if chosen.is_none() {
                        chosen = self
                            .try_alternate_listing(
                                provider.as_ref(),
                                &canonical,
                                &symbol_id,
                                from,
                                as_of,
                                &mut warnings,
                            )
                            .await;
                    }

                    let Some(row) = chosen else {
                        warnings.push(format!(
                            "{provider_id}: no rows in window {from} ~ {as_of}"
                        ));
                        continue;
                    };

                    let proof = self
                        .build_success(index, &canonical, as_of, row, warnings, false)
                        .await;
                    return Ok(proof);
                }
                Err(e) => {
                    self.penalize(provider_id, &e);
                    warnings.push(format!("{provider_id}: {e}"));
                }
            }
        }

        // Last resort: the requested date may be outside every provider's
        // coverage; sweep a much wider window on the highest-trust sources
        // to surface the most recent row that exists at all.
        let wide_from = as_of - Duration::days(i64::from(self.config.wide_window_days));
        for (index, provider) in self
            .providers
            .iter()
            .enumerate()
            .take(self.config.wide_window_providers)
        {
            let provider_id = provider.id();

            if !self.circuit_breaker.is_allowed(provider_id) {
                continue;
            }

            let symbol_id = self.symbol_for(provider.as_ref(), &canonical);

            match provider.fetch(&symbol_id, wide_from, as_of).await {
                Ok(rows) => {
                    self.circuit_breaker.record_success(provider_id);

                    if let Some(row) = latest_on_or_before(&rows, as_of).cloned() {
                        warnings.push(format!(
                            "requested date {} not covered by any source; returning most \
                             recent available row {} from {}",
                            as_of, row.trade_date, provider_id
                        ));
                        let proof = self
                            .build_success(index, &canonical, as_of, row, warnings, true)
                            .await;
                        return Ok(proof);
                    }
                }
                Err(e) => {
                    self.penalize(provider_id, &e);
                    warnings.push(format!("{provider_id}: wide-window retry failed: {e}"));
                }
            }
        }

        warn!(
            "All sources exhausted for {} as of {}: {} warnings",
            canonical.id,
            as_of,
            warnings.len()
        );
        warnings.push("all sources exhausted: no provider returned a usable row".to_string());
        Ok(PriceProof::failure(canonical, as_of, warnings))
    }

    /// Pick the symbol form a provider expects, honoring explicit
    /// per-provider overrides in the canonical symbol.
    fn symbol_for(&self, provider: &dyn PriceDataProvider, symbol: &CanonicalSymbol) -> String {
        if let Some(explicit) = symbol.provider_ids.get(provider.id()) {
            return explicit.clone();
        }
        match provider.symbol_form() {
            SymbolForm::Bare => symbol.id.clone(),
            SymbolForm::YahooStyle => symbol.yahoo_symbol().to_string(),
        }
    }

    /// Retry a Yahoo-style provider once with the alternate Taiwan listing
    /// when the exchange was guessed from a bare numeric code.
    async fn try_alternate_listing(
        &self,
        provider: &dyn PriceDataProvider,
        symbol: &CanonicalSymbol,
        tried: &str,
        from: NaiveDate,
        to: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> Option<PriceRow> {
        if provider.symbol_form() != SymbolForm::YahooStyle {
            return None;
        }
        let alternate = symbol.alternate_yahoo_symbol()?;

        debug!(
            "'{}': no rows for {}, retrying alternate listing {}",
            provider.id(),
            tried,
            alternate
        );

        match provider.fetch(&alternate, from, to).await {
            Ok(rows) => {
                let row = latest_on_or_before(&rows, to).cloned()?;
                info!(
                    "'{}': resolved {} to alternate listing {}",
                    provider.id(),
                    symbol.id,
                    alternate
                );
                warnings.push(format!(
                    "{}: no rows for {}, matched alternate listing {}",
                    provider.id(),
                    tried,
                    alternate
                ));
                Some(row)
            }
            Err(e) => {
                self.penalize(provider.id(), &e);
                warnings.push(format!(
                    "{}: alternate listing {} failed: {}",
                    provider.id(),
                    alternate,
                    e
                ));
                None
            }
        }
    }

    /// Record a circuit breaker penalty when the error class calls for one.
    fn penalize(&self, provider_id: &str, error: &PriceDataError) {
        match error.retry_class() {
            RetryClass::FailoverWithPenalty | RetryClass::CircuitOpen => {
                self.circuit_breaker.record_failure(provider_id);
            }
            RetryClass::Never | RetryClass::NextProvider => {}
        }
    }

    /// Assemble a success proof: fallback bookkeeping, advisory
    /// cross-check, trust annotation.
    async fn build_success(
        &self,
        provider_index: usize,
        symbol: &CanonicalSymbol,
        as_of: NaiveDate,
        row: PriceRow,
        mut warnings: Vec<String>,
        forced_fallback: bool,
    ) -> PriceProof {
        let provider = &self.providers[provider_index];
        let fallback_used = forced_fallback || row.trade_date != as_of;

        if row.trade_date != as_of {
            warnings.push(format!(
                "non-trading-day fallback: used {} <= {}",
                row.trade_date, as_of
            ));
        }

        if !provider.trusted() {
            warnings.push(format!(
                "{}: external best-effort source, value is advisory",
                provider.id()
            ));
        }

        let mut cross_checks = std::collections::HashMap::new();
        if let Some((other_id, check)) = self
            .cross_check(provider_index, symbol, &row, &mut warnings)
            .await
        {
            cross_checks.insert(other_id, check);
        }

        info!(
            "Accepted {} close {} for {} from '{}' (fallback: {})",
            row.trade_date,
            row.close,
            symbol.id,
            provider.id(),
            fallback_used
        );

        PriceProof {
            success: true,
            source: provider.id().to_string(),
            symbol: symbol.clone(),
            as_of_date: as_of,
            trade_date: Some(row.trade_date),
            row: Some(row),
            warnings,
            cross_checks,
            fallback_used,
        }
    }

    /// Ask at most one lower-priority, breaker-allowed provider for the
    /// accepted trade date and compare closes.
    ///
    /// Failures here are advisory: they are recorded as warnings and never
    /// discard the accepted row.
    async fn cross_check(
        &self,
        accepted_index: usize,
        symbol: &CanonicalSymbol,
        base: &PriceRow,
        warnings: &mut Vec<String>,
    ) -> Option<(String, CrossCheckResult)> {
        let partner = self
            .providers
            .iter()
            .skip(accepted_index + 1)
            .find(|p| self.circuit_breaker.is_allowed(p.id()))?;

        let partner_id = partner.id();
        let symbol_id = self.symbol_for(partner.as_ref(), symbol);

        match partner
            .fetch(&symbol_id, base.trade_date, base.trade_date)
            .await
        {
            Ok(rows) => {
                self.circuit_breaker.record_success(partner_id);
                let other = latest_on_or_before(&rows, base.trade_date);
                let check = compare_rows(base, other, self.config.cross_check_tolerance);
                debug!(
                    "Cross-check against '{}': match={} diff={:?}",
                    partner_id, check.matched, check.close_diff_pct
                );
                Some((partner_id.to_string(), check))
            }
            Err(e) => {
                self.penalize(partner_id, &e);
                warnings.push(format!("{partner_id}: cross-check fetch failed: {e}"));
                None
            }
        }
    }
}

/// Compare the accepted row against a secondary row.
///
/// The diff percentage is only computed when both rows cover the same
/// trading day; a date disagreement is a mismatch without a number.
fn compare_rows(base: &PriceRow, other: Option<&PriceRow>, tolerance: f64) -> CrossCheckResult {
    let Some(other) = other else {
        return CrossCheckResult {
            matched: false,
            close_diff_pct: None,
            reason: Some("no row for trade date".to_string()),
            compared_row: None,
        };
    };

    if other.trade_date != base.trade_date {
        return CrossCheckResult {
            matched: false,
            close_diff_pct: None,
            reason: Some(format!(
                "date mismatch {} vs {}",
                base.trade_date, other.trade_date
            )),
            compared_row: Some(other.clone()),
        };
    }

    if base.close.is_zero() {
        return CrossCheckResult {
            matched: false,
            close_diff_pct: None,
            reason: Some("base close is zero".to_string()),
            compared_row: Some(other.clone()),
        };
    }

    let diff_pct = ((other.close - base.close).abs() / base.close).to_f64();
    match diff_pct {
        Some(pct) => CrossCheckResult {
            matched: pct <= tolerance,
            close_diff_pct: Some(pct),
            reason: (pct > tolerance).then(|| format!("close differs by {:.4}%", pct * 100.0)),
            compared_row: Some(other.clone()),
        },
        None => CrossCheckResult {
            matched: false,
            close_diff_pct: None,
            reason: Some("close difference not representable".to_string()),
            compared_row: Some(other.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CircuitBreakerConfig;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    /// Key under which a mock serves rows regardless of requested symbol.
    const ANY_SYMBOL: &str = "*";

    struct MockProvider {
        id: &'static str,
        priority: u8,
        trusted: bool,
        form: SymbolForm,
        should_fail: bool,
        rows: HashMap<String, Vec<PriceRow>>,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, priority: u8, rows: Vec<PriceRow>) -> Self {
            let mut map = HashMap::new();
            map.insert(ANY_SYMBOL.to_string(), rows);
            Self {
                id,
                priority,
                trusted: true,
                form: SymbolForm::Bare,
                should_fail: false,
                rows: map,
                call_count: AtomicUsize::new(0),
            }
        }

        fn failing(id: &'static str, priority: u8) -> Self {
            let mut provider = Self::new(id, priority, Vec::new());
            provider.should_fail = true;
            provider
        }

        fn with_symbol_rows(
            id: &'static str,
            priority: u8,
            rows: HashMap<String, Vec<PriceRow>>,
        ) -> Self {
            Self {
                id,
                priority,
                trusted: true,
                form: SymbolForm::Bare,
                should_fail: false,
                rows,
                call_count: AtomicUsize::new(0),
            }
        }

        fn untrusted(mut self) -> Self {
            self.trusted = false;
            self
        }

        fn yahoo_style(mut self) -> Self {
            self.form = SymbolForm::YahooStyle;
            self
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PriceDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn trusted(&self) -> bool {
            self.trusted
        }

        fn symbol_form(&self) -> SymbolForm {
            self.form
        }

        async fn fetch(
            &self,
            symbol_id: &str,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<PriceRow>, PriceDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if self.should_fail {
                return Err(PriceDataError::ProviderUnavailable {
                    provider: self.id.to_string(),
                    message: "mock failure".to_string(),
                });
            }

            let rows = self
                .rows
                .get(symbol_id)
                .or_else(|| self.rows.get(ANY_SYMBOL))
                .cloned()
                .unwrap_or_default();

            Ok(rows
                .into_iter()
                .filter(|row| row.trade_date >= from && row.trade_date <= to)
                .collect())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(trade_date: NaiveDate, close: Decimal) -> PriceRow {
        PriceRow {
            trade_date,
            open: close - dec!(1),
            high: close + dec!(2),
            low: close - dec!(2),
            close,
            volume: 10_000,
        }
    }

    fn coordinator(providers: Vec<Arc<dyn PriceDataProvider>>) -> PriceProofCoordinator {
        PriceProofCoordinator::new(providers)
    }

    #[tokio::test]
    async fn test_first_provider_wins_and_is_cross_checked() {
        let friday = date(2024, 1, 5);
        let primary = Arc::new(MockProvider::new("TEJ", 1, vec![row(friday, dec!(100))]));
        let secondary = Arc::new(MockProvider::new("TWSE", 5, vec![row(friday, dec!(100.2))]));

        let coord = coordinator(vec![primary, secondary]);
        let proof = coord.get_verified_price("2330", friday).await.unwrap();

        assert!(proof.success);
        assert_eq!(proof.source, "TEJ");
        assert_eq!(proof.trade_date, Some(friday));
        assert!(!proof.fallback_used);

        let check = proof.cross_checks.get("TWSE").unwrap();
        assert!(check.matched);
        assert!(check.close_diff_pct.unwrap() <= 0.005);
    }

    #[tokio::test]
    async fn test_failing_first_provider_falls_back_with_warning() {
        let friday = date(2024, 1, 5);
        let primary = Arc::new(MockProvider::failing("TEJ", 1));
        let secondary = Arc::new(MockProvider::new("TWSE", 5, vec![row(friday, dec!(98))]));

        let coord = coordinator(vec![primary, secondary]);
        let proof = coord.get_verified_price("2330", friday).await.unwrap();

        assert!(proof.success);
        assert_eq!(proof.source, "TWSE");
        assert!(proof.warnings.iter().any(|w| w.contains("TEJ")));
    }

    #[tokio::test]
    async fn test_weekend_falls_back_to_friday() {
        let friday = date(2024, 1, 5);
        let saturday = date(2024, 1, 6);
        let primary = Arc::new(MockProvider::new("TEJ", 1, vec![row(friday, dec!(100))]));

        let coord = coordinator(vec![primary]);
        let proof = coord.get_verified_price("2330", saturday).await.unwrap();

        assert!(proof.success);
        assert!(proof.fallback_used);
        assert_eq!(proof.trade_date, Some(friday));
        assert!(proof.warnings.iter().any(|w| w.contains("fallback")));
    }

    #[tokio::test]
    async fn test_trade_date_never_exceeds_as_of() {
        let as_of = date(2024, 1, 5);
        let rows = vec![
            row(date(2024, 1, 4), dec!(99)),
            row(date(2024, 1, 8), dec!(105)),
        ];
        let primary = Arc::new(MockProvider::new("TEJ", 1, rows));

        let coord = coordinator(vec![primary]);
        let proof = coord.get_verified_price("2330", as_of).await.unwrap();

        assert!(proof.trade_date.unwrap() <= as_of);
        assert_eq!(proof.trade_date, Some(date(2024, 1, 4)));
    }

    #[tokio::test]
    async fn test_cross_check_mismatch_is_advisory() {
        let friday = date(2024, 1, 5);
        let primary = Arc::new(MockProvider::new("TEJ", 1, vec![row(friday, dec!(100))]));
        // 2% apart - well over the 0.5% tolerance
        let secondary = Arc::new(MockProvider::new("YAHOO", 9, vec![row(friday, dec!(102))]));

        let coord = coordinator(vec![primary, secondary]);
        let proof = coord.get_verified_price("2330", friday).await.unwrap();

        assert!(proof.success);
        let check = proof.cross_checks.get("YAHOO").unwrap();
        assert!(!check.matched);
        assert!(check.close_diff_pct.unwrap() > 0.005);
        assert!(check.reason.is_some());
    }

    #[tokio::test]
    async fn test_all_sources_exhausted_returns_failure_proof() {
        let primary = Arc::new(MockProvider::failing("TEJ", 1));
        let secondary = Arc::new(MockProvider::failing("TWSE", 5));

        let coord = coordinator(vec![primary, secondary]);
        let proof = coord
            .get_verified_price("2330", date(2024, 1, 5))
            .await
            .unwrap();

        assert!(!proof.success);
        assert_eq!(proof.source, crate::models::NO_SOURCE);
        assert!(proof.row.is_none());
        assert!(!proof.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_open_circuit_skips_provider() {
        let friday = date(2024, 1, 5);
        let primary = Arc::new(MockProvider::new("TEJ", 1, vec![row(friday, dec!(100))]));
        let secondary = Arc::new(MockProvider::new("TWSE", 5, vec![row(friday, dec!(100))]));
        let primary_handle = primary.clone();

        let breaker = CircuitBreaker::with_config(CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: StdDuration::from_secs(600),
        });
        breaker.record_failure("TEJ");

        let coord = PriceProofCoordinator::with_config(
            vec![primary, secondary],
            CoordinatorConfig::default(),
            breaker,
        );
        let proof = coord.get_verified_price("2330", friday).await.unwrap();

        assert_eq!(proof.source, "TWSE");
        assert_eq!(primary_handle.calls(), 0);
        assert!(proof
            .warnings
            .iter()
            .any(|w| w.contains("circuit breaker open")));
    }

    #[tokio::test]
    async fn test_wide_window_rescues_stale_coverage() {
        let as_of = date(2024, 6, 1);
        let old_row = row(date(2024, 2, 20), dec!(88));
        let primary = Arc::new(MockProvider::new("TEJ", 1, vec![old_row]));

        let coord = coordinator(vec![primary]);
        let proof = coord.get_verified_price("2330", as_of).await.unwrap();

        assert!(proof.success);
        assert!(proof.fallback_used);
        assert_eq!(proof.trade_date, Some(date(2024, 2, 20)));
        assert!(proof.warnings.iter().any(|w| w.contains("not covered")));
    }

    #[tokio::test]
    async fn test_wide_window_only_consults_highest_trust_providers() {
        let as_of = date(2024, 6, 1);
        let primary = Arc::new(MockProvider::new("TEJ", 1, Vec::new()));
        let secondary = Arc::new(MockProvider::new("TWSE", 5, Vec::new()));
        let tertiary = Arc::new(MockProvider::new(
            "YAHOO",
            9,
            vec![row(date(2024, 2, 20), dec!(88))],
        ));
        let tertiary_handle = tertiary.clone();

        let coord = coordinator(vec![primary, secondary, tertiary]);
        let proof = coord.get_verified_price("2330", as_of).await.unwrap();

        assert!(!proof.success);
        // One call from the normal waterfall, none from the wide sweep
        assert_eq!(tertiary_handle.calls(), 1);
    }

    #[tokio::test]
    async fn test_alternate_listing_retry_for_inferred_exchange() {
        let friday = date(2024, 1, 5);
        let mut rows = HashMap::new();
        rows.insert("8069.TWO".to_string(), vec![row(friday, dec!(55))]);
        let provider = Arc::new(MockProvider::with_symbol_rows("YAHOO", 9, rows).yahoo_style());

        let coord = coordinator(vec![provider]);
        let proof = coord.get_verified_price("8069", friday).await.unwrap();

        assert!(proof.success);
        assert_eq!(proof.source, "YAHOO");
        assert!(proof
            .warnings
            .iter()
            .any(|w| w.contains("alternate listing 8069.TWO")));
    }

    #[tokio::test]
    async fn test_no_alternate_retry_for_explicit_suffix() {
        let friday = date(2024, 1, 5);
        let mut rows = HashMap::new();
        rows.insert("8069.TWO".to_string(), vec![row(friday, dec!(55))]);
        let provider = Arc::new(MockProvider::with_symbol_rows("YAHOO", 9, rows).yahoo_style());
        let handle = provider.clone();

        let coord = coordinator(vec![provider]);
        let proof = coord.get_verified_price("8069.TW", friday).await.unwrap();

        assert!(!proof.success);
        // Normal window plus wide window, no alternate in between
        assert_eq!(handle.calls(), 2);
    }

    #[tokio::test]
    async fn test_untrusted_source_adds_advisory_warning() {
        let friday = date(2024, 1, 5);
        let provider =
            Arc::new(MockProvider::new("YAHOO", 9, vec![row(friday, dec!(100))]).untrusted());

        let coord = coordinator(vec![provider]);
        let proof = coord.get_verified_price("2330", friday).await.unwrap();

        assert!(proof.success);
        assert!(proof.warnings.iter().any(|w| w.contains("advisory")));
    }

    #[tokio::test]
    async fn test_empty_symbol_is_rejected_before_any_fetch() {
        let provider = Arc::new(MockProvider::new("TEJ", 1, Vec::new()));
        let handle = provider.clone();

        let coord = coordinator(vec![provider]);
        let result = coord.get_verified_price("   ", date(2024, 1, 5)).await;

        assert!(matches!(
            result,
            Err(PriceDataError::InvalidInput { .. })
        ));
        assert_eq!(handle.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_cross_check_without_second_provider() {
        let friday = date(2024, 1, 5);
        let provider = Arc::new(MockProvider::new("TEJ", 1, vec![row(friday, dec!(100))]));

        let coord = coordinator(vec![provider]);
        let proof = coord.get_verified_price("2330", friday).await.unwrap();

        assert!(proof.success);
        assert!(proof.cross_checks.is_empty());
    }

    #[tokio::test]
    async fn test_providers_ordered_by_priority_not_insertion() {
        let friday = date(2024, 1, 5);
        let low = Arc::new(MockProvider::new("YAHOO", 9, vec![row(friday, dec!(99))]));
        let high = Arc::new(MockProvider::new("TEJ", 1, vec![row(friday, dec!(100))]));

        // Inserted lowest-trust first
        let coord = coordinator(vec![low, high]);
        let proof = coord.get_verified_price("2330", friday).await.unwrap();

        assert_eq!(proof.source, "TEJ");
        assert_eq!(proof.row.unwrap().close, dec!(100));
    }

    #[test]
    fn test_compare_rows_date_mismatch_has_no_diff() {
        let base = row(date(2024, 1, 5), dec!(100));
        let other = row(date(2024, 1, 4), dec!(100));

        let check = compare_rows(&base, Some(&other), 0.005);
        assert!(!check.matched);
        assert!(check.close_diff_pct.is_none());
        assert!(check.reason.unwrap().contains("date mismatch"));
    }

    #[test]
    fn test_compare_rows_missing_other() {
        let base = row(date(2024, 1, 5), dec!(100));

        let check = compare_rows(&base, None, 0.005);
        assert!(!check.matched);
        assert!(check.close_diff_pct.is_none());
        assert!(check.compared_row.is_none());
    }

    #[test]
    fn test_compare_rows_within_tolerance() {
        let base = row(date(2024, 1, 5), dec!(100));
        let other = row(date(2024, 1, 5), dec!(100.4));

        let check = compare_rows(&base, Some(&other), 0.005);
        assert!(check.matched);
        assert!((check.close_diff_pct.unwrap() - 0.004).abs() < 1e-9);
    }
}

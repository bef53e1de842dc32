//! Canonicalization of heterogeneous instrument identifiers.
//!
//! Providers disagree on how a Taiwan instrument is written: the exchange
//! feeds want the bare code ("2330"), Yahoo-style feeds want a market
//! suffix ("2330.TW" / "8069.TWO"), and callers type all of the above plus
//! prefixed forms ("TW:2330", "OTC:8069"). Normalization happens exactly
//! once per lookup, before the first provider is called.

use std::collections::HashMap;

use crate::models::{forms, CanonicalSymbol, Exchange, Market};

/// Parse an arbitrary instrument identifier into a [`CanonicalSymbol`].
///
/// Never fails: unrecognized input degrades to a US-market identity with
/// the uppercased input as the code, because downstream providers perform
/// their own final validation.
///
/// Rules, first match wins:
/// 1. Suffix `.TW` - Taiwan primary-listed
/// 2. Suffix `.TWO` - Taiwan OTC-listed
/// 3. Prefix `TW:` / `TSE:` - Taiwan primary-listed
/// 4. Prefix `TWO:` / `OTC:` - Taiwan OTC-listed
/// 5. Pure digits, length 3-6 - assumed Taiwan primary-listed. A bare
///    numeric code cannot distinguish a primary listing from an OTC one,
///    so the result is flagged `exchange_inferred`; callers needing
///    precision must supply an explicit suffix.
/// 6. Anything else - uppercased input as-is, US market
pub fn normalize(raw: &str) -> CanonicalSymbol {
    let input = raw.trim().to_uppercase();

    if let Some(base) = input.strip_suffix(".TW") {
        return taiwan(raw, base, Exchange::PrimaryListed, false);
    }
    if let Some(base) = input.strip_suffix(".TWO") {
        return taiwan(raw, base, Exchange::OtcListed, false);
    }

    if let Some((prefix, code)) = input.split_once(':') {
        match prefix {
            "TW" | "TSE" => return taiwan(raw, code, Exchange::PrimaryListed, false),
            "TWO" | "OTC" => return taiwan(raw, code, Exchange::OtcListed, false),
            _ => {}
        }
    }

    if (3..=6).contains(&input.len()) && input.bytes().all(|b| b.is_ascii_digit()) {
        return taiwan(raw, &input, Exchange::PrimaryListed, true);
    }

    let mut provider_ids = HashMap::new();
    provider_ids.insert(forms::BARE.to_string(), input.clone());
    provider_ids.insert(forms::YAHOO.to_string(), input.clone());
    CanonicalSymbol {
        raw_input: raw.to_string(),
        id: input,
        market: Market::Us,
        exchange: Exchange::Unknown,
        exchange_inferred: false,
        provider_ids,
    }
}

fn taiwan(raw: &str, code: &str, exchange: Exchange, inferred: bool) -> CanonicalSymbol {
    let suffix = match exchange {
        Exchange::OtcListed => ".TWO",
        _ => ".TW",
    };
    let mut provider_ids = HashMap::new();
    provider_ids.insert(forms::BARE.to_string(), code.to_string());
    provider_ids.insert(forms::YAHOO.to_string(), format!("{code}{suffix}"));
    CanonicalSymbol {
        raw_input: raw.to_string(),
        id: code.to_string(),
        market: Market::Tw,
        exchange,
        exchange_inferred: inferred,
        provider_ids,
    }
}

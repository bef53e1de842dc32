use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Canonical symbol form keys used in [`CanonicalSymbol::provider_ids`].
pub mod forms {
    /// Plain instrument code, no market suffix (e.g. "2330").
    pub const BARE: &str = "bare";
    /// Yahoo-style ticker with market suffix (e.g. "2330.TW").
    pub const YAHOO: &str = "yahoo";
}

/// Market an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    /// Taiwan (TWSE or TPEx)
    Tw,
    /// United States
    Us,
    /// Anything else
    Other,
}

/// Listing venue within a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exchange {
    /// Primary listing (e.g. TWSE for Taiwan)
    PrimaryListed,
    /// Over-the-counter listing (e.g. TPEx for Taiwan)
    OtcListed,
    /// Could not be determined from the input
    Unknown,
}

/// Provider-agnostic instrument identity, derived once per lookup.
///
/// Produced by [`normalize`](crate::resolver::normalize) and never mutated
/// afterwards. `provider_ids` carries at least the [`forms::BARE`] and
/// [`forms::YAHOO`] symbol forms; callers may also insert per-provider
/// overrides keyed by provider id, which take precedence during resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSymbol {
    /// The input exactly as the caller supplied it.
    pub raw_input: String,

    /// Provider-agnostic instrument code (uppercased, suffix stripped).
    pub id: String,

    /// Market classification.
    pub market: Market,

    /// Listing venue classification.
    pub exchange: Exchange,

    /// True when the exchange was guessed from a bare numeric code.
    ///
    /// A bare code like "2330" cannot distinguish a primary listing from
    /// an OTC one; the normalizer defaults to primary-listed. This flag
    /// lets the coordinator retry the alternate listing when the guess
    /// turns up nothing.
    pub exchange_inferred: bool,

    /// Symbol forms keyed by form name or provider id.
    pub provider_ids: HashMap<String, String>,
}

impl CanonicalSymbol {
    /// The Yahoo-style ticker (code plus market suffix, or the code
    /// unchanged for non-Taiwan instruments).
    pub fn yahoo_symbol(&self) -> &str {
        self.provider_ids
            .get(forms::YAHOO)
            .map(String::as_str)
            .unwrap_or(&self.id)
    }

    /// The alternate Taiwan listing for a guessed exchange, if any.
    ///
    /// Returns `Some("2330.TWO")` for a bare "2330" that was assumed
    /// primary-listed, and the `.TW` form for an assumed OTC listing.
    /// `None` when the caller supplied an explicit suffix or the
    /// instrument is not a Taiwan listing.
    pub fn alternate_yahoo_symbol(&self) -> Option<String> {
        if self.market != Market::Tw || !self.exchange_inferred {
            return None;
        }
        match self.exchange {
            Exchange::PrimaryListed => Some(format!("{}.TWO", self.id)),
            Exchange::OtcListed => Some(format!("{}.TW", self.id)),
            Exchange::Unknown => None,
        }
    }
}

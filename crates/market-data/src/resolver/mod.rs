//! Instrument identifier resolution.
//!
//! Resolution from raw caller input to the provider-specific symbol happens
//! before the provider boundary: [`normalize`] builds the canonical
//! identity once, and the coordinator picks the form each provider wants.

mod normalizer;

pub use normalizer::normalize;

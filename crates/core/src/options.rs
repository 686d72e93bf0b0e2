//! Output options shared by every exporter

use serde::{Deserialize, Serialize};

/// Number of decimal digits kept when precision trimming is enabled
pub const TRIMMED_DECIMALS: i32 = 2;

/// Caller-selected output options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Reduce numeric fields to [`TRIMMED_DECIMALS`] decimal digits
    #[serde(default)]
    pub trim_precision: bool,
    /// Use compact XML attribute names and the short schema reference
    #[serde(default)]
    pub short_attributes: bool,
    /// Drop robot console output and debug properties
    #[serde(default)]
    pub skip_debug: bool,
}

impl OutputOptions {
    /// Options with everything disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Set precision trimming (builder pattern)
    pub fn with_trim_precision(mut self, trim: bool) -> Self {
        self.trim_precision = trim;
        self
    }

    /// Set short XML attributes (builder pattern)
    pub fn with_short_attributes(mut self, short: bool) -> Self {
        self.short_attributes = short;
        self
    }

    /// Set debug detail stripping (builder pattern)
    pub fn with_skip_debug(mut self, skip: bool) -> Self {
        self.skip_debug = skip;
        self
    }

    /// Format a float according to these options
    pub fn format_f64(&self, value: f64) -> String {
        format_decimal(value, self.trim_precision)
    }
}

/// Round to [`TRIMMED_DECIMALS`] decimal digits
pub fn round_decimal(value: f64) -> f64 {
    let factor = 10f64.powi(TRIMMED_DECIMALS);
    (value * factor).round() / factor
}

/// Render a float as text
///
/// Without trimming this is the shortest representation that parses back to
/// the same value. With trimming at most [`TRIMMED_DECIMALS`] digits are kept
/// and trailing zeros are dropped (`12.50` → `12.5`, `3.00` → `3`).
pub fn format_decimal(value: f64, trim: bool) -> String {
    if !trim {
        return value.to_string();
    }
    let fixed = format!("{:.*}", TRIMMED_DECIMALS as usize, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

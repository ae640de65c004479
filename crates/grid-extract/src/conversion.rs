//! Conversion of raw stored values to physical values.

use serde::{Deserialize, Serialize};

/// Scale/offset unpacking with missing-value substitution.
///
/// Missing values and the valid range refer to the raw (packed) values, as
/// in the CF conventions. Anything missing or out of range becomes NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueConversion {
    #[serde(default = "default_scale")]
    pub scale_factor: f64,
    #[serde(default)]
    pub add_offset: f64,
    /// Raw values meaning "no data" (fill values).
    #[serde(default)]
    pub missing_values: Vec<f64>,
    /// Inclusive raw range `[min, max]` of valid values.
    #[serde(default)]
    pub valid_range: Option<(f64, f64)>,
}

fn default_scale() -> f64 {
    1.0
}

impl Default for ValueConversion {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            add_offset: 0.0,
            missing_values: Vec::new(),
            valid_range: None,
        }
    }
}

impl ValueConversion {
    /// Pass values through unchanged, NaN stays NaN.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Linear unpacking `raw * scale_factor + add_offset`.
    pub fn scaled(scale_factor: f64, add_offset: f64) -> Self {
        Self {
            scale_factor,
            add_offset,
            ..Self::default()
        }
    }

    /// Add a raw fill value.
    pub fn with_missing_value(mut self, value: f64) -> Self {
        self.missing_values.push(value);
        self
    }

    /// Set the inclusive raw valid range.
    pub fn with_valid_range(mut self, min: f64, max: f64) -> Self {
        self.valid_range = Some((min, max));
        self
    }

    /// Whether `raw` counts as missing.
    pub fn is_missing(&self, raw: f64) -> bool {
        if raw.is_nan() {
            return true;
        }
        if self.missing_values.iter().any(|&m| m == raw) {
            return true;
        }
        match self.valid_range {
            Some((min, max)) => raw < min || raw > max,
            None => false,
        }
    }

    /// Convert one raw value.
    pub fn convert(&self, raw: f64) -> f32 {
        if self.is_missing(raw) {
            f32::NAN
        } else {
            (raw * self.scale_factor + self.add_offset) as f32
        }
    }
}

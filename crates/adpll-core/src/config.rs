//! Core configuration
//!
//! Synthesis-time parameters of the core. None of these are reachable
//! through the pin contract; only the loop gain is programmable at run time
//! (see [`crate::registers`]).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::phase_detector::ComparatorMode;
use crate::registers::GAIN_MAX;

/// Build-time parameters of the ADPLL core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Width of the signed control word
    pub control_word_bits: u8,
    /// Width of the DCO phase accumulator; `dco_out` is its MSB
    pub accumulator_bits: u8,
    /// Accumulator increment when the control word is zero
    pub center_increment: u32,
    /// `fb_clk` = `dco_out` / `feedback_divider`
    pub feedback_divider: u16,
    /// Gain register contents after reset
    pub reset_gain: u8,
    /// Phase comparator flavour
    pub comparator: ComparatorMode,
    /// Ticks without a reference edge before tracking falls back to
    /// free-run holdover. `None` keeps tracking indefinitely.
    pub reference_timeout: Option<u32>,
    /// Lock detector window length in ticks
    pub lock_window: u16,
    /// Maximum absolute net phase error over one window for lock
    pub lock_threshold: u16,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            control_word_bits: 12,
            accumulator_bits: 16,
            center_increment: 4096, // 16-tick free-run period
            feedback_divider: 2,
            reset_gain: 4,
            comparator: ComparatorMode::EdgeCoincidence,
            reference_timeout: Some(512),
            lock_window: 64,
            lock_threshold: 2,
        }
    }
}

impl CoreConfig {
    /// Smallest representable control word. Meaningful only for widths
    /// [`validate`](Self::validate) accepts.
    pub fn control_word_min(&self) -> i32 {
        -(1i32 << (self.control_word_bits - 1))
    }

    /// Largest representable control word
    pub fn control_word_max(&self) -> i32 {
        (1i32 << (self.control_word_bits - 1)) - 1
    }

    /// Modulus of the DCO phase accumulator
    pub fn accumulator_modulus(&self) -> u64 {
        1u64 << self.accumulator_bits
    }

    /// Free-run period of `dco_out` in ticks (control word zero)
    pub fn free_run_period(&self) -> f64 {
        self.accumulator_modulus() as f64 / self.center_increment as f64
    }

    /// Check every field against the ranges the core can realise.
    pub fn validate(&self) -> ConfigResult<()> {
        check_range("control_word_bits", self.control_word_bits as i64, 2, 24)?;
        check_range("accumulator_bits", self.accumulator_bits as i64, 4, 31)?;
        check_range("reset_gain", self.reset_gain as i64, 0, GAIN_MAX as i64)?;
        check_range("lock_window", self.lock_window as i64, 1, u16::MAX as i64)?;

        if self.feedback_divider < 2 || self.feedback_divider % 2 != 0 {
            return Err(ConfigError::InvalidDivider(self.feedback_divider));
        }

        // The increment must stay positive (strictly monotonic rate) and
        // at most half the modulus (never more than one toggle per tick).
        let lowest = self.center_increment as i64 + self.control_word_min() as i64;
        let highest = self.center_increment as i64 + self.control_word_max() as i64;
        let limit = (self.accumulator_modulus() / 2) as i64;
        if lowest < 1 || highest > limit {
            return Err(ConfigError::DcoRange {
                center: self.center_increment,
                cw_min: self.control_word_min(),
                cw_max: self.control_word_max(),
                lowest,
                highest,
                limit,
            });
        }

        Ok(())
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> ConfigResult<()> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = CoreConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.control_word_min(), -2048);
        assert_eq!(cfg.control_word_max(), 2047);
        assert!((cfg.free_run_period() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_aliasing_dco() {
        let cfg = CoreConfig {
            center_increment: 32_000,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DcoRange { .. }));
        assert_eq!(err.field(), Some("center_increment"));
    }

    #[test]
    fn test_rejects_non_monotonic_dco() {
        // center + cw_min would reach zero
        let cfg = CoreConfig {
            center_increment: 2048,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::DcoRange { .. })));
    }

    #[test]
    fn test_rejects_odd_divider() {
        let cfg = CoreConfig {
            feedback_divider: 3,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidDivider(3))));
    }

    #[test]
    fn test_rejects_wide_gain() {
        let cfg = CoreConfig {
            reset_gain: 32,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.field(), Some("reset_gain"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg = CoreConfig::from_json_str(r#"{ "reset_gain": 9, "comparator": "tri_state" }"#)
            .unwrap();
        assert_eq!(cfg.reset_gain, 9);
        assert_eq!(cfg.comparator, ComparatorMode::TriState);
        assert_eq!(cfg.control_word_bits, 12);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            CoreConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            CoreConfig::from_json_str(r#"{ "feedback_divider": 0 }"#),
            Err(ConfigError::InvalidDivider(0))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("core.json");
        let cfg = CoreConfig {
            reference_timeout: None,
            lock_window: 128,
            ..Default::default()
        };
        cfg.save(&path).unwrap();
        let loaded = CoreConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_missing_file() {
        let err = CoreConfig::load("/nonexistent/adpll.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert_eq!(err.field(), None);
    }
}

#![forbid(unsafe_code)]

//! Channel bounds configuration.
//!
//! [`ChannelBounds`] holds the inclusive range each channel-settings
//! parameter may take. The host document owns one and hands it to the
//! settings dialog and to the song edits, so the dialog and the edits agree
//! on what is in range.
//!
//! # Loading
//!
//! With the `config` feature the bounds can be read from TOML or JSON.
//! Missing sections keep their defaults:
//!
//! ```toml
//! [pitch_channels]
//! min = 1
//! max = 8
//! ```

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use tonebox_runtime::CommandError;

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clamp into the range. `min` wins if the range is inverted.
    #[must_use]
    pub fn clamp(&self, value: u32) -> u32 {
        value.min(self.max).max(self.min)
    }

    /// Check `value`, naming it `what` in the error.
    pub fn check(&self, what: &'static str, value: u32) -> Result<(), CommandError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(CommandError::OutOfRange {
                what,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Bounds for every parameter the channel settings dialog edits.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ChannelBounds {
    pub pitch_channels: Bounds,
    pub noise_channels: Bounds,
    pub patterns_per_channel: Bounds,
    pub instruments_per_channel: Bounds,
}

impl Default for ChannelBounds {
    fn default() -> Self {
        Self {
            pitch_channels: Bounds::new(1, 6),
            noise_channels: Bounds::new(0, 3),
            patterns_per_channel: Bounds::new(1, 64),
            instruments_per_channel: Bounds::new(1, 10),
        }
    }
}

impl ChannelBounds {
    /// Load from a TOML string. The result is validated.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let bounds: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        bounds.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string. The result is validated.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let bounds: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        bounds.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate the ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, bounds) in [
            ("pitch_channels", self.pitch_channels),
            ("noise_channels", self.noise_channels),
            ("patterns_per_channel", self.patterns_per_channel),
            ("instruments_per_channel", self.instruments_per_channel),
        ] {
            if bounds.min > bounds.max {
                errors.push(format!(
                    "{name}.min ({}) must be <= {name}.max ({})",
                    bounds.min, bounds.max
                ));
            }
        }

        // Every channel needs at least one pattern and one instrument
        if self.patterns_per_channel.min == 0 {
            errors.push("patterns_per_channel.min must be > 0".into());
        }
        if self.instruments_per_channel.min == 0 {
            errors.push("instruments_per_channel.min must be > 0".into());
        }

        if self.pitch_channels.max.saturating_add(self.noise_channels.max) == 0 {
            errors.push("pitch_channels.max + noise_channels.max must be > 0".into());
        }

        errors
    }

    /// Return `self` if [`validate`](Self::validate) finds nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading channel bounds.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_validates_clean() {
        let errors = ChannelBounds::default().validate();
        assert!(errors.is_empty(), "default should validate: {errors:?}");
    }

    #[test]
    fn default_ranges() {
        let bounds = ChannelBounds::default();
        assert_eq!(bounds.pitch_channels, Bounds::new(1, 6));
        assert_eq!(bounds.noise_channels, Bounds::new(0, 3));
        assert_eq!(bounds.patterns_per_channel, Bounds::new(1, 64));
        assert_eq!(bounds.instruments_per_channel, Bounds::new(1, 10));
    }

    #[test]
    fn validate_catches_inverted_range() {
        let mut bounds = ChannelBounds::default();
        bounds.noise_channels = Bounds::new(4, 2);
        let errors = bounds.validate();
        assert!(errors.iter().any(|e| e.contains("noise_channels.min")));
    }

    #[test]
    fn validate_catches_zero_pattern_minimum() {
        let mut bounds = ChannelBounds::default();
        bounds.patterns_per_channel.min = 0;
        let errors = bounds.validate();
        assert!(errors.iter().any(|e| e.contains("patterns_per_channel.min")));
    }

    #[test]
    fn validate_catches_no_channels() {
        let mut bounds = ChannelBounds::default();
        bounds.pitch_channels = Bounds::new(0, 0);
        bounds.noise_channels = Bounds::new(0, 0);
        let errors = bounds.validate();
        assert!(errors.iter().any(|e| e.contains("must be > 0")));
    }

    #[test]
    fn validated_wraps_errors() {
        let mut bounds = ChannelBounds::default();
        bounds.instruments_per_channel.min = 0;
        let err = bounds.validated().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v.len() == 1));
        assert!(err.to_string().starts_with("validation errors:"));
    }

    #[test]
    fn clamp_and_check() {
        let bounds = Bounds::new(1, 16);
        assert_eq!(bounds.clamp(0), 1);
        assert_eq!(bounds.clamp(999), 16);
        assert_eq!(bounds.clamp(7), 7);
        assert!(bounds.check("patterns per channel", 16).is_ok());
        assert_eq!(
            bounds.check("patterns per channel", 17),
            Err(CommandError::OutOfRange {
                what: "patterns per channel",
                value: 17,
                min: 1,
                max: 16,
            })
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn toml_partial_keeps_defaults() {
        let bounds = ChannelBounds::from_toml_str(
            r#"
            [pitch_channels]
            min = 2
            max = 8
            "#,
        )
        .unwrap();
        assert_eq!(bounds.pitch_channels, Bounds::new(2, 8));
        assert_eq!(bounds.noise_channels, Bounds::new(0, 3));
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_roundtrip() {
        let bounds = ChannelBounds::default();
        let json = serde_json::to_string(&bounds).unwrap();
        assert_eq!(ChannelBounds::from_json_str(&json).unwrap(), bounds);
    }

    #[cfg(feature = "config")]
    #[test]
    fn bad_toml_is_an_error() {
        let err = ChannelBounds::from_toml_str("pitch_channels = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn toml_file_loads() {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[patterns_per_channel]\nmin = 1\nmax = 32").unwrap();
        let bounds = ChannelBounds::from_toml_file(tmp.path()).unwrap();
        assert_eq!(bounds.patterns_per_channel, Bounds::new(1, 32));
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_file_loads() {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"instruments_per_channel": {{"min": 2, "max": 4}}}}"#).unwrap();
        let bounds = ChannelBounds::from_json_file(tmp.path()).unwrap();
        assert_eq!(bounds.instruments_per_channel, Bounds::new(2, 4));
        assert_eq!(bounds.pitch_channels, Bounds::new(1, 6));
    }

    #[cfg(feature = "config")]
    #[test]
    fn loaders_reject_inverted_ranges() {
        let err = ChannelBounds::from_toml_str(
            r#"
            [noise_channels]
            min = 4
            max = 2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v[0].contains("noise_channels")));

        let err = ChannelBounds::from_json_str(r#"{"patterns_per_channel": {"min": 0, "max": 8}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[cfg(feature = "config")]
    #[test]
    fn missing_file_is_io_error() {
        let err = ChannelBounds::from_toml_file("/nonexistent/tonebox-bounds.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

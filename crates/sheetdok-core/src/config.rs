//! Conversion settings
//!
//! Settings are read from a `sheetdok.toml` file:
//!
//! ```toml
//! [render]
//! mode = "sheet"
//! strict = true
//! include_hidden_sheets = false
//! standalone_html = true
//!
//! [geometry]
//! tolerance = 150.0
//! ```
//!
//! Every key is optional; missing keys take the defaults of
//! [`RenderOptions::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use sheetdok_diagrams::InferenceConfig;
use thiserror::Error;

use crate::render::{RenderMode, RenderOptions};

/// Conventional settings file name
pub const SETTINGS_FILE: &str = "sheetdok.toml";

/// Errors while reading a settings file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Top-level settings structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub render: RenderSettings,
    pub geometry: InferenceConfig,
}

/// `[render]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub mode: RenderMode,
    /// Fail when any unsupported element was found
    pub strict: bool,
    /// Render hidden and very hidden sheets in work and sheet view
    pub include_hidden_sheets: bool,
    /// Emit sheet view as a standalone HTML document
    pub standalone_html: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            mode: RenderMode::Work,
            strict: false,
            include_hidden_sheets: true,
            standalone_html: false,
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Read settings from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading settings from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }

    /// Read `sheetdok.toml` from a directory if it exists, defaults otherwise
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Self, ConfigError> {
        let path = dir.as_ref().join(SETTINGS_FILE);
        if path.is_file() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.geometry.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "geometry.tolerance must be a non-negative number, got {}",
                tolerance
            )));
        }
        Ok(())
    }

    /// Options for [`crate::render_with_options`]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            mode: self.render.mode,
            strict: self.render.strict,
            include_hidden_sheets: self.render.include_hidden_sheets,
            standalone_html: self.render.standalone_html,
            inference: self.geometry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());

        let options = settings.render_options();
        assert_eq!(options, RenderOptions::default());
        assert_eq!(options.inference.tolerance, 220.0);
    }

    #[test]
    fn test_partial_file() {
        let settings = Settings::from_toml_str(
            r#"
[render]
mode = "full"
strict = true

[geometry]
tolerance = 50.0
"#,
        )
        .unwrap();

        assert_eq!(settings.render.mode, RenderMode::Full);
        assert!(settings.render.strict);
        assert!(settings.render.include_hidden_sheets);
        assert_eq!(settings.geometry.tolerance, 50.0);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = Settings::from_toml_str("[render]\nmode = \"pdf\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_negative_tolerance_is_rejected() {
        let err = Settings::from_toml_str("[geometry]\ntolerance = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::discover(dir.path()).unwrap(), Settings::default());

        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "[render]\nstandalone_html = true\n",
        )
        .unwrap();
        let settings = Settings::discover(dir.path()).unwrap();
        assert!(settings.render.standalone_html);
    }
}

//! Run configuration.
//!
//! Settings are layered: built-in defaults, then a YAML file, then
//! [`ConfigOverrides`] (usually taken from command-line flags).
//!
//! ```yaml
//! colors: never
//! stop_on_failure: true
//! filter: parser
//! verbose: false
//! format: console
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConfigError;

/// File names searched in the working directory when no path is given.
pub const CONFIG_FILE_NAMES: [&str; 2] = ["testify.yaml", "testify.yml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Always,
    Never,
    #[default]
    Auto,
}

impl ColorMode {
    /// Resolves `Auto` against whether stdout is a terminal.
    pub fn enabled(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => atty::is(atty::Stream::Stdout),
        }
    }

    pub fn color_choice(self) -> termcolor::ColorChoice {
        if self.enabled() {
            termcolor::ColorChoice::Always
        } else {
            termcolor::ColorChoice::Never
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub colors: ColorMode,
    /// Report every test after the first Failed/Errored one as Skipped.
    pub stop_on_failure: bool,
    /// Case-insensitive substring matched against `suite path > test name`.
    pub filter: Option<String>,
    pub verbose: bool,
    pub format: OutputFormat,
}

/// Values that replace file settings when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub colors: Option<ColorMode>,
    pub stop_on_failure: Option<bool>,
    pub filter: Option<String>,
    pub verbose: Option<bool>,
    pub format: Option<OutputFormat>,
}

impl Config {
    /// Loads `path` if given, else the first config file found in the
    /// working directory, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound {
                        path: path.to_path_buf(),
                    });
                }
                Self::from_file(path)
            }
            None => match Self::discover(Path::new(".")) {
                Some(found) => Self::from_file(&found),
                None => {
                    debug!("no config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// First of [`CONFIG_FILE_NAMES`] that exists under `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading config");
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse { source })
    }

    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(colors) = overrides.colors {
            self.colors = colors;
        }
        if let Some(stop) = overrides.stop_on_failure {
            self.stop_on_failure = stop;
        }
        if let Some(filter) = overrides.filter {
            self.filter = Some(filter);
        }
        if let Some(verbose) = overrides.verbose {
            self.verbose = verbose;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        self
    }

    /// The filter, lowercased once for matching.
    pub fn normalized_filter(&self) -> Option<String> {
        self.filter
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
    }

    #[test]
    fn yaml_fields_are_read() {
        let config = Config::from_yaml_str(
            "colors: never\nstop_on_failure: true\nfilter: Parser\nformat: json\n",
        )
        .unwrap();
        assert_eq!(config.colors, ColorMode::Never);
        assert!(config.stop_on_failure);
        assert_eq!(config.normalized_filter().as_deref(), Some("parser"));
        assert_eq!(config.format, OutputFormat::Json);
        assert!(!config.verbose);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_yaml_str("colour: never\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let config = Config::from_yaml_str("verbose: true\nfilter: a\n")
            .unwrap()
            .merge(ConfigOverrides {
                filter: Some("b".into()),
                colors: Some(ColorMode::Always),
                ..ConfigOverrides::default()
            });
        assert!(config.verbose);
        assert_eq!(config.filter.as_deref(), Some("b"));
        assert!(config.colors.enabled());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = Config::load(Some(Path::new("definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn blank_filter_is_ignored() {
        let config = Config {
            filter: Some("  ".into()),
            ..Config::default()
        };
        assert_eq!(config.normalized_filter(), None);
    }
}

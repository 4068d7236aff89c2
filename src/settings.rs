use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::theme::Palette;
use crate::viewer::{DEFAULT_WORKERS, RenderOptions, ViewerConfig};

const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pageview";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid colour {0:?}, expected #rrggbb")]
    Colour(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteSettings {
    #[serde(default = "default_border")]
    pub border: String,
    #[serde(default = "default_text")]
    pub text: String,
    #[serde(default = "default_muted")]
    pub muted: String,
    #[serde(default = "default_error")]
    pub error: String,
}

impl Default for PaletteSettings {
    fn default() -> Self {
        Self {
            border: default_border(),
            text: default_text(),
            muted: default_muted(),
            error: default_error(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Max viewport height, percent of the body area between the header
    /// and help lines
    #[serde(default = "default_viewport_height_percent")]
    pub viewport_height_percent: u16,

    /// Rows each page view occupies
    #[serde(default = "default_page_height_rows")]
    pub page_height_rows: u16,

    #[serde(default = "default_scroll_step")]
    pub scroll_step: u16,

    #[serde(default)]
    pub text_layer: bool,

    #[serde(default)]
    pub annotation_layer: bool,

    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub palette: PaletteSettings,
}

fn default_viewport_height_percent() -> u16 {
    55
}

fn default_page_height_rows() -> u16 {
    12
}

fn default_scroll_step() -> u16 {
    3
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_border() -> String {
    "#65737e".to_string()
}

fn default_text() -> String {
    "#c0c5ce".to_string()
}

fn default_muted() -> String {
    "#4f5b66".to_string()
}

fn default_error() -> String {
    "#ec5f67".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            viewport_height_percent: default_viewport_height_percent(),
            page_height_rows: default_page_height_rows(),
            scroll_step: default_scroll_step(),
            text_layer: false,
            annotation_layer: false,
            workers: default_workers(),
            log_level: default_log_level(),
            palette: PaletteSettings::default(),
        }
    }
}

impl Settings {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => {
                    info!("Could not determine config directory, using default settings");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            debug!("Settings file {path:?} not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        let settings = Self::from_yaml(&content).map_err(|source| SettingsError::Yaml {
            path: path.clone(),
            source,
        })?;
        debug!("Loaded settings from {path:?}");
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let mut settings: Settings = serde_yaml::from_str(content)?;
        settings.normalize();
        Ok(settings)
    }

    fn normalize(&mut self) {
        self.viewport_height_percent = self.viewport_height_percent.clamp(10, 100);
        self.page_height_rows = self.page_height_rows.max(3);
        self.scroll_step = self.scroll_step.max(1);
        self.workers = self.workers.max(1);
    }

    #[must_use]
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            text_layer: self.text_layer,
            annotation_layer: self.annotation_layer,
        }
    }

    #[must_use]
    pub fn viewer_config(&self) -> ViewerConfig {
        ViewerConfig {
            workers: self.workers,
            render_options: self.render_options(),
        }
    }

    pub fn palette(&self) -> Result<Palette, SettingsError> {
        Palette::from_settings(&self.palette)
    }
}

#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_yaml_yields_defaults() {
        let settings = Settings::from_yaml("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.viewport_height_percent, 55);
        assert_eq!(settings.render_options(), RenderOptions::default());
    }

    #[test]
    fn serialized_settings_carry_no_version() {
        let yaml = serde_yaml::to_string(&Settings::default()).unwrap();
        assert!(!yaml.contains("version"));

        let settings = Settings::from_yaml("version: 3\nscroll_step: 5\n").unwrap();
        assert_eq!(settings.scroll_step, 5);
    }

    #[test]
    fn values_are_clamped() {
        let settings =
            Settings::from_yaml("viewport_height_percent: 400\nscroll_step: 0\nworkers: 0\n")
                .unwrap();
        assert_eq!(settings.viewport_height_percent, 100);
        assert_eq!(settings.scroll_step, 1);
        assert_eq!(settings.workers, 1);
    }

    #[test]
    fn layers_can_be_enabled() {
        let settings = Settings::from_yaml("text_layer: true\n").unwrap();
        let options = settings.viewer_config().render_options;
        assert!(options.text_layer);
        assert!(!options.annotation_layer);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(Some(&dir.path().join("nope.yaml"))).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "workers: [not, a, number]").unwrap();

        let err = Settings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, SettingsError::Yaml { .. }));
    }

    #[test]
    fn file_overrides_are_applied() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_height_rows: 20\npalette:\n  border: \"#ffffff\"").unwrap();

        let settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.page_height_rows, 20);
        assert_eq!(settings.palette.border, "#ffffff");
        assert_eq!(settings.palette.text, default_text());
    }
}

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dynamics::DynamicsParams;

pub const DEFAULT_AUDIO_BITRATE: &str = "192k";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dynamics: DynamicsParams,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub audio_codec: Option<String>,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            audio_codec: None,
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

fn default_audio_bitrate() -> String { DEFAULT_AUDIO_BITRATE.into() }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::debug!("Config parse error in {}: {}", path.display(), err);
            None
        }
    }
}

/// `explicit`, else `./serene.toml`, else the per-user config file.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("serene.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("serene").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("serene").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamics::params::{DEFAULT_TIME_FADE, DEFAULT_TIME_TICK};
    use std::io::Write;

    #[test]
    fn partial_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [dynamics]
            tap_value = 16.0
            bass_weight = 2.5
            "#,
        )
        .unwrap();
        assert_eq!(config.dynamics.tap_value, 16.0);
        assert_eq!(config.dynamics.bass_weight, 2.5);
        assert_eq!(config.dynamics.time_tick, DEFAULT_TIME_TICK);
        assert_eq!(config.dynamics.time_fade, DEFAULT_TIME_FADE);
        assert_eq!(config.output.audio_bitrate, DEFAULT_AUDIO_BITRATE);
        assert!(config.output.audio_codec.is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.dynamics, DynamicsParams::default());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\naudio_codec = \"aac\"\naudio_bitrate = \"256k\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.output.audio_codec.as_deref(), Some("aac"));
        assert_eq!(config.output.audio_bitrate, "256k");
    }

    #[test]
    fn malformed_file_is_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dynamics]\ntap_value = \"loud\"").unwrap();
        assert!(load_config(file.path()).is_none());
        assert!(load_config(Path::new("/nonexistent/serene.toml")).is_none());
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/somewhere/custom.toml");
        assert_eq!(find_config(Some(path)), Some(path.to_path_buf()));
    }
}

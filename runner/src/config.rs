//! Configuration management.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Sample clip streamed by the playback programs when no URI is configured.
pub const DEFAULT_URI: &str =
    "https://gstreamer.freedesktop.org/data/media/sintel_trailer-480p.webm";

/// Application configuration, matching the TOML file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[serde(default)]
    #[garde(skip)]
    pub logging: LoggingConfig,
    #[serde(default)]
    #[garde(dive)]
    pub deepstream: DeepStreamConfig,
    #[serde(default)]
    #[garde(dive)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stderr)
    pub log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    pub log_level: Option<String>,
}

/// Settings for the object detection and tracking pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DeepStreamConfig {
    /// Muxer output width in pixels
    #[garde(range(min = 1))]
    pub muxer_width: u32,
    /// Muxer output height in pixels
    #[garde(range(min = 1))]
    pub muxer_height: u32,
    #[garde(range(min = 1))]
    pub batch_size: u32,
    /// How long the muxer waits for a full batch, in microseconds
    #[garde(skip)]
    pub batched_push_timeout_us: i32,
    /// Inference engine configuration file
    #[garde(length(min = 1))]
    pub pgie_config_path: String,
    /// Tracker low-level library
    #[garde(length(min = 1))]
    pub tracker_lib_path: String,
    /// Where the annotated video is written
    #[garde(length(min = 1))]
    pub output_path: String,
}

impl Default for DeepStreamConfig {
    fn default() -> Self {
        Self {
            muxer_width: 1920,
            muxer_height: 1080,
            batch_size: 1,
            batched_push_timeout_us: 40000,
            pgie_config_path: "/opt/nvidia/deepstream/deepstream/sources/apps/sample_apps/deepstream-test1/dstest1_pgie_config.txt".to_string(),
            tracker_lib_path: "/opt/nvidia/deepstream/deepstream/lib/libnvds_nvmultiobjecttracker.so".to_string(),
            output_path: "output.mp4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Media URI for the playback programs
    #[garde(length(min = 1))]
    pub uri: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
        }
    }
}

impl Config {
    /// Load configuration with full priority chain: explicit file > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `config.toml` in user config directory (~/.config/pipewright/ on Linux)
    /// 2. `.pipewright.toml` in current directory
    ///
    /// A file given with `--config` must exist and wins over everything else.
    pub fn from_figment(config_file: Option<&Path>) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir()
            .ok()
            .map(|d| d.join(".pipewright.toml"));
        let user_config = directories::ProjectDirs::from("", "", "pipewright")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // 1. Start with defaults
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // 2. Merge user config file if it exists
        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // 3. Merge local config file if it exists
        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        // 4. Merge environment variables (PIPEWRIGHT_* prefix, `__` separates sections)
        figment = figment.merge(Env::prefixed("PIPEWRIGHT_").split("__"));

        // 5. Merge the explicit config file (highest priority)
        if let Some(path) = config_file {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    /// Run `f` inside `dir`, restoring the working directory afterwards.
    fn in_dir<T>(dir: &Path, f: impl FnOnce() -> T) -> T {
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let result = f();
        // Restore (ignore errors)
        let _ = std::env::set_current_dir(original_dir);
        result
    }

    #[test]
    #[serial]
    fn test_from_figment_defaults() {
        std::env::remove_var("PIPEWRIGHT_PLAYBACK__URI");
        std::env::remove_var("PIPEWRIGHT_DEEPSTREAM__BATCH_SIZE");

        // Run in a temp directory to avoid picking up a project .pipewright.toml
        let temp_dir = TempDir::new().unwrap();
        let config = in_dir(temp_dir.path(), || Config::from_figment(None)).unwrap();

        assert_eq!(config.deepstream.muxer_width, 1920);
        assert_eq!(config.deepstream.muxer_height, 1080);
        assert_eq!(config.deepstream.batch_size, 1);
        assert_eq!(config.deepstream.batched_push_timeout_us, 40000);
        assert_eq!(config.deepstream.output_path, "output.mp4");
        assert_eq!(config.playback.uri, DEFAULT_URI);
        assert!(config.logging.log_file.is_none());
    }

    #[test]
    #[serial]
    fn test_from_figment_local_config_file() {
        std::env::remove_var("PIPEWRIGHT_PLAYBACK__URI");

        let temp_dir = TempDir::new().unwrap();
        let config_content = r#"
[deepstream]
muxer_width = 1280
muxer_height = 720

[playback]
uri = "file:///tmp/clip.webm"
"#;
        fs::write(temp_dir.path().join(".pipewright.toml"), config_content).unwrap();

        let config = in_dir(temp_dir.path(), || Config::from_figment(None)).unwrap();

        assert_eq!(config.deepstream.muxer_width, 1280);
        assert_eq!(config.deepstream.muxer_height, 720);
        // Untouched keys keep their defaults
        assert_eq!(config.deepstream.batch_size, 1);
        assert_eq!(config.playback.uri, "file:///tmp/clip.webm");
    }

    #[test]
    #[serial]
    fn test_from_figment_env_vars_override_config_file() {
        let original = std::env::var("PIPEWRIGHT_PLAYBACK__URI").ok();

        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(".pipewright.toml"),
            "[playback]\nuri = \"file:///from/file\"",
        )
        .unwrap();
        std::env::set_var("PIPEWRIGHT_PLAYBACK__URI", "file:///from/env");

        let config = in_dir(temp_dir.path(), || Config::from_figment(None));

        match original {
            Some(uri) => std::env::set_var("PIPEWRIGHT_PLAYBACK__URI", uri),
            None => std::env::remove_var("PIPEWRIGHT_PLAYBACK__URI"),
        }

        assert_eq!(config.unwrap().playback.uri, "file:///from/env");
    }

    #[test]
    #[serial]
    fn test_explicit_file_overrides_env() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = temp_dir.path().join("custom.toml");
        fs::write(&explicit, "[deepstream]\nbatch_size = 4\noutput_path = \"out.mp4\"").unwrap();
        std::env::set_var("PIPEWRIGHT_DEEPSTREAM__BATCH_SIZE", "2");

        let config = in_dir(temp_dir.path(), || Config::from_figment(Some(&explicit)));
        std::env::remove_var("PIPEWRIGHT_DEEPSTREAM__BATCH_SIZE");

        let config = config.unwrap();
        assert_eq!(config.deepstream.batch_size, 4);
        assert_eq!(config.deepstream.output_path, "out.mp4");
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");
        let result = in_dir(temp_dir.path(), || Config::from_figment(Some(&missing)));
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_validation_rejects_zero_dimensions() {
        let temp_dir = TempDir::new().unwrap();
        let explicit = temp_dir.path().join("bad.toml");
        fs::write(&explicit, "[deepstream]\nmuxer_width = 0").unwrap();

        let result = in_dir(temp_dir.path(), || Config::from_figment(Some(&explicit)));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_empty_uri() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.playback.uri.clear();
        assert!(config.validate().is_err());
    }
}

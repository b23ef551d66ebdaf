/// Player configuration
use crate::error::{CliError, Result};
use cadence_library::DEFAULT_CACHE_SIZE;
use cadence_playback::{ControllerConfig, FocusRequest, LoopMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CadenceConfig {
    #[serde(default)]
    pub library: LibrarySettings,

    #[serde(default)]
    pub playback: PlaybackSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrarySettings {
    /// Directories scanned for audio files
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// File extensions to include; empty means the built-in list
    #[serde(default)]
    pub extensions: Vec<String>,

    #[serde(default = "default_artwork_cache_size")]
    pub artwork_cache_size: usize,

    #[serde(default)]
    pub follow_links: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackSettings {
    #[serde(default = "default_rewind_threshold_ms")]
    pub rewind_threshold_ms: u64,

    #[serde(default = "default_position_interval_ms")]
    pub position_interval_ms: u64,

    /// 0 disables the prepare timeout
    #[serde(default = "default_prepare_timeout_ms")]
    pub prepare_timeout_ms: u64,

    #[serde(default)]
    pub loop_mode: LoopMode,

    #[serde(default)]
    pub focus: FocusRequest,

    /// Clock multiplier of the simulated engine
    #[serde(default = "default_simulation_speed")]
    pub simulation_speed: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl CadenceConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` in the working
    /// directory is read when present. `CADENCE_<SECTION>__<KEY>` variables
    /// override both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, environment())
    }

    fn load_from(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(env);

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.library.artwork_cache_size == 0 {
            return Err(CliError::Config(
                "library.artwork_cache_size must be at least 1".to_string(),
            ));
        }

        if self.playback.position_interval_ms == 0 {
            return Err(CliError::Config(
                "playback.position_interval_ms must be at least 1".to_string(),
            ));
        }

        let speed = self.playback.simulation_speed;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(CliError::Config(format!(
                "playback.simulation_speed must be positive, got {speed}"
            )));
        }

        Ok(())
    }

    /// Library roots, falling back to the working directory
    pub fn roots(&self, cli_dir: Option<&Path>) -> Vec<PathBuf> {
        match cli_dir {
            Some(dir) => vec![dir.to_path_buf()],
            None if self.library.roots.is_empty() => vec![PathBuf::from(".")],
            None => self.library.roots.clone(),
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        let playback = &self.playback;
        ControllerConfig {
            rewind_threshold_ms: playback.rewind_threshold_ms,
            position_interval_ms: playback.position_interval_ms,
            prepare_timeout_ms: (playback.prepare_timeout_ms > 0)
                .then_some(playback.prepare_timeout_ms),
            focus_request: playback.focus,
            loop_mode: playback.loop_mode,
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("CADENCE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("library.roots")
        .with_list_parse_key("library.extensions")
}

// Default values
fn default_artwork_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_rewind_threshold_ms() -> u64 {
    3_000
}

fn default_position_interval_ms() -> u64 {
    250
}

fn default_prepare_timeout_ms() -> u64 {
    10_000
}

fn default_simulation_speed() -> f64 {
    1.0
}

fn default_log_filter() -> String {
    "cadence=info".to_string()
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: Vec::new(),
            artwork_cache_size: default_artwork_cache_size(),
            follow_links: false,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            rewind_threshold_ms: default_rewind_threshold_ms(),
            position_interval_ms: default_position_interval_ms(),
            prepare_timeout_ms: default_prepare_timeout_ms(),
            loop_mode: LoopMode::default(),
            focus: FocusRequest::default(),
            simulation_speed: default_simulation_speed(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

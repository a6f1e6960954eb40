use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lib_ratio::{ConfigError, RatioConfig};

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[clap(about = "Support ratio JSON API server", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "RATIO_PORT", help = "Port to listen on for client connections.")]
    pub port: Option<u16>,

    #[clap(long, env = "RATIO_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "RATIO_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "RATIO_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "RATIO_SOURCE_URL", help = "Upstream population CSV URL.")]
    pub source_url: Option<String>,

    #[clap(long, env = "RATIO_CACHE_FILE", help = "File holding the cached rows and fetch timestamp.")]
    pub cache_file: Option<PathBuf>,

    #[clap(long, env = "RATIO_FRESHNESS_SECS", help = "Seconds a cached snapshot stays fresh.")]
    pub freshness_secs: Option<u64>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            source_url: other.source_url.or(self.source_url),
            cache_file: other.cache_file.or(self.cache_file),
            freshness_secs: other.freshness_secs.or(self.freshness_secs),
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| "info".to_string())
    }

    /// Pipeline settings: `RATIO_*` environment values, overridden by
    /// whatever this config sets.
    pub fn ratio_config(&self) -> Result<RatioConfig, ConfigError> {
        let mut ratio = RatioConfig::from_env()?;
        if let Some(url) = &self.source_url {
            ratio.source_url = url.clone();
        }
        if let Some(path) = &self.cache_file {
            ratio.cache_file = path.clone();
        }
        if let Some(secs) = self.freshness_secs {
            ratio.freshness_window = Duration::from_secs(secs);
        }
        Ok(ratio)
    }
}

const DEFAULT_PORT: u16 = 9010;

fn defaults() -> Config {
    Config {
        port: Some(DEFAULT_PORT),
        log_dir: Some(PathBuf::from("./logs")),
        log_level: Some("info".to_string()),
        ..Default::default()
    }
}

/// Reads a JSON config file. `None` when the file is absent or unusable.
fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        eprintln!("Config file not found at {}. Using defaults and environment/CLI variables.", path.display());
        return None;
    }
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<Config>(&config_str) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}

/// Layers defaults < config file < environment/CLI.
pub fn layer_config(cli: Config) -> Config {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("server_ratio.conf"));

    let mut current_config = defaults();
    if let Some(file_config) = read_config_file(&config_file_path) {
        current_config = current_config.merge(file_config);
    }
    current_config.merge(cli)
}

pub fn load_config() -> Config {
    // .env values must be in the environment before clap reads it
    dotenvy::dotenv().ok();
    layer_config(Config::parse())
}

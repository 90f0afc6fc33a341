use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://ship.freightos.com/api/shippingCalculator";
const APP_DIR: &str = "freight-quote";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration for the quote client.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub rate_limit_file: PathBuf,
}

/// Optional JSON config file; every key may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub rate_limit_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn user_dir(
    lookup: &dyn Fn(&str) -> Option<String>,
    xdg_key: &str,
    home_suffix: &str,
) -> Option<PathBuf> {
    lookup(xdg_key)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            lookup("HOME")
                .filter(|s| !s.is_empty())
                .map(|h| Path::new(&h).join(home_suffix))
        })
}

/// `$XDG_CACHE_HOME/freight-quote/rate-limit.json`, else under `~/.cache`,
/// else the OS temp dir.
pub fn default_rate_limit_file(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    user_dir(lookup, "XDG_CACHE_HOME", ".cache")
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR)
        .join("rate-limit.json")
}

/// Where call history lives when no config file could be read: the env
/// override, else the default location.
pub fn fallback_rate_limit_file(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    lookup("FREIGHT_QUOTE_RATE_LIMIT_FILE")
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| default_rate_limit_file(lookup))
}

pub fn default_config_file(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    user_dir(lookup, "XDG_CONFIG_HOME", ".config").map(|d| d.join(APP_DIR).join("config.json"))
}

impl Config {
    /// Load configuration: defaults, then the config file, then environment.
    ///
    /// Env vars:
    /// - FREIGHT_QUOTE_CONFIG (config file path; default ~/.config/freight-quote/config.json)
    /// - FREIGHT_QUOTE_API_URL (default: the public shipping calculator)
    /// - FREIGHT_QUOTE_HTTP_TIMEOUT_SECS (default: 30)
    /// - FREIGHT_QUOTE_USER_AGENT (default: freight-quote/<version>)
    /// - FREIGHT_QUOTE_RATE_LIMIT_FILE (default: ~/.cache/freight-quote/rate-limit.json)
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_lookup(config_path, &|k| env::var(k).ok())
    }

    pub fn from_lookup(
        config_path: Option<&Path>,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // An explicitly named file must exist; the default location may not.
        let explicit = config_path
            .map(Path::to_path_buf)
            .or_else(|| lookup("FREIGHT_QUOTE_CONFIG").map(PathBuf::from));
        let file = match explicit {
            Some(p) => FileConfig::read(&p)?,
            None => match default_config_file(lookup).filter(|p| p.is_file()) {
                Some(p) => FileConfig::read(&p)?,
                None => FileConfig::default(),
            },
        };

        let api_url = lookup("FREIGHT_QUOTE_API_URL")
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_secs = match lookup("FREIGHT_QUOTE_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "FREIGHT_QUOTE_HTTP_TIMEOUT_SECS",
                value: raw.clone(),
            })?,
            None => file.timeout_secs.unwrap_or(30),
        };
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "timeout_secs",
                value: "0".into(),
            });
        }
        let user_agent = lookup("FREIGHT_QUOTE_USER_AGENT")
            .or(file.user_agent)
            .unwrap_or_else(|| format!("freight-quote/{}", env!("CARGO_PKG_VERSION")));
        let rate_limit_file = lookup("FREIGHT_QUOTE_RATE_LIMIT_FILE")
            .map(PathBuf::from)
            .or(file.rate_limit_file)
            .unwrap_or_else(|| default_rate_limit_file(lookup));

        Ok(Self {
            api_url,
            timeout_secs,
            user_agent,
            rate_limit_file,
        })
    }
}

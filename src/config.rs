// Configuration: everything the client needs, gathered once in `main` and
// handed to `BinClient::new`. Values come from the process environment
// first and from a `.env` file second. The process environment is never
// modified.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

/// Variable holding the JSONBin master key.
pub const KEY_VAR: &str = "JSONBIN_KEY";
/// Optional override for the API root.
pub const BASE_URL_VAR: &str = "JSONBIN_BASE_URL";
/// Optional request timeout in seconds. Unset means no timeout.
pub const TIMEOUT_VAR: &str = "JSONBIN_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.jsonbin.io/v3";

/// Client configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub master_key: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("master_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Config for the public service with the given master key.
    pub fn new(master_key: impl Into<String>) -> Self {
        Config {
            master_key: master_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Load from the process environment and a `.env` file.
    ///
    /// With `env_file` set, that file must exist. Otherwise `./.env` and
    /// then `<config dir>/jsonbin-cli/.env` are tried; neither is required.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        let dotenv = match env_file {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::EnvFileMissing { path: path.to_path_buf() });
            }
            Some(path) => read_env_file(path)?,
            None => match default_env_files().into_iter().find(|p| p.is_file()) {
                Some(path) => read_env_file(&path)?,
                None => HashMap::new(),
            },
        };

        Self::from_lookup(layered(|var| std::env::var(var).ok(), &dotenv))
    }

    /// Build from any variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let master_key = get(KEY_VAR).ok_or(ConfigError::MissingKey { var: KEY_VAR })?;
        let mut config = Config::new(master_key);

        if let Some(url) = get(BASE_URL_VAR) {
            config = config.with_base_url(url);
        }

        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidTimeout {
                var: TIMEOUT_VAR,
                value: raw.clone(),
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// `.env` locations tried when none is given explicitly, in order.
pub fn default_env_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(".env")];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("jsonbin-cli").join(".env"));
    }
    files
}

/// Look `var` up in `env` first and fall back to `dotenv`. A blank value
/// in `env` does not shadow the `.env` one.
fn layered<'a, E>(env: E, dotenv: &'a HashMap<String, String>) -> impl Fn(&str) -> Option<String> + 'a
where
    E: Fn(&str) -> Option<String> + 'a,
{
    move |var| {
        env(var)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| dotenv.get(var).cloned())
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    debug!(path = %path.display(), "reading env file");
    let to_err = |source: dotenvy::Error| ConfigError::EnvFile {
        path: path.to_path_buf(),
        source,
    };
    let iter = dotenvy::from_path_iter(path).map_err(to_err)?;
    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(to_err)?;
        vars.insert(key, value);
    }
    Ok(vars)
}

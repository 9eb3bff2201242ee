use crate::error::{ConfigErrorKind, InfraError, InfraResult};
use crate::input::history::HistoryPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tcp_addr: String, // e.g. "127.0.0.1:4000"
    pub prompt: String,
    pub history: HistoryPolicy,
    /// Names offered by tab completion.
    pub symbols: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tcp_addr: "127.0.0.1:4000".to_string(),
            prompt: "> ".to_string(),
            history: HistoryPolicy::default(),
            symbols: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> InfraResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| config_error(path, ConfigErrorKind::Read(e)))?;
        let cfg: Self = toml::from_str(&data).map_err(|e| config_error(path, ConfigErrorKind::Parse(e)))?;
        Ok(cfg)
    }

    /// Reads `.env`, then an optional `RAWLINE_CONFIG` file, then per-field overrides.
    pub fn from_env() -> InfraResult<Self> {
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> InfraResult<Self> {
        let mut cfg = match var("RAWLINE_CONFIG") {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(addr) = var("RAWLINE_TCP_ADDR") {
            cfg.tcp_addr = addr;
        }
        if let Some(prompt) = var("RAWLINE_PROMPT") {
            cfg.prompt = prompt;
        }
        if let Some(v) = var("RAWLINE_HISTORY_SKIP_BLANK") {
            cfg.history.skip_blank = parse_env("RAWLINE_HISTORY_SKIP_BLANK", &v)?;
        }
        if let Some(v) = var("RAWLINE_HISTORY_DEDUP") {
            cfg.history.dedup_consecutive = parse_env("RAWLINE_HISTORY_DEDUP", &v)?;
        }
        if let Some(v) = var("RAWLINE_HISTORY_MAX") {
            cfg.history.max_entries = Some(parse_env("RAWLINE_HISTORY_MAX", &v)?);
        }
        if let Some(v) = var("RAWLINE_SYMBOLS") {
            cfg.symbols = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        Ok(cfg)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> InfraResult<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        config_error(".env", ConfigErrorKind::InvalidEnv(key.to_string(), e.to_string()))
    })
}

fn config_error(path: impl Into<PathBuf>, source: ConfigErrorKind) -> InfraError {
    InfraError::Config {
        path: path.into(),
        source,
    }
}

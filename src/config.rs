use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV_PREFIX: &str = "MEDIUM_RESPONSES";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            base_url: default_base_url(),
            timeout: default_timeout(),
        }
    }
}

fn default_user_agent() -> String {
    format!("medium-responses/{}", env!("CARGO_PKG_VERSION"))
}

fn default_base_url() -> String {
    crate::medium::MEDIUM_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_open")]
    pub open: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            open: default_open(),
        }
    }
}

fn default_open() -> bool {
    true
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    apply_env(&mut cfg, prefix);

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.http.user_agent.is_empty() {
        base.http.user_agent = other.http.user_agent;
    }
    if !other.http.base_url.is_empty() {
        base.http.base_url = other.http.base_url;
    }
    if other.http.timeout != Duration::ZERO {
        base.http.timeout = other.http.timeout;
    }

    if other.output.dir.is_some() {
        base.output.dir = other.output.dir;
    }
    base.output.open = other.output.open;

    base
}

fn apply_env(cfg: &mut Config, prefix: &str) {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    for (key, value) in map {
        apply_env_value(cfg, &key, value);
    }
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) {
    match key {
        "http.user_agent" => cfg.http.user_agent = value,
        "http.base_url" => cfg.http.base_url = value,
        "http.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.http.timeout = duration;
            }
        }
        "output.dir" => cfg.output.dir = Some(PathBuf::from(value)),
        "output.open" => {
            cfg.output.open = matches!(value.as_str(), "1" | "true" | "TRUE" | "True");
        }
        _ => {}
    }
}

pub fn default_path() -> Option<PathBuf> {
    default_config_path()
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("medium-responses").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    #[test]
    fn load_defaults_without_files() {
        let cfg = load(LoadOptions {
            config_file: Some(PathBuf::from("/nonexistent/config.yaml")),
            env_prefix: Some("MEDIUM_RESPONSES_TEST_NONE".into()),
        })
        .unwrap();
        assert_eq!(cfg.http.base_url, default_base_url());
        assert_eq!(cfg.http.timeout, default_timeout());
        assert!(cfg.output.open);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "http:\n  user_agent: custom/1.0\n  timeout: 5s\noutput:\n  open: false\n",
        )
        .unwrap();

        let cfg = load(LoadOptions {
            config_file: Some(path),
            env_prefix: Some("MEDIUM_RESPONSES_TEST_FILE".into()),
        })
        .unwrap();
        assert_eq!(cfg.http.user_agent, "custom/1.0");
        assert_eq!(cfg.http.timeout, Duration::from_secs(5));
        assert!(!cfg.output.open);
    }

    #[test]
    fn env_overrides() {
        env::set_var("MEDIUM_RESPONSES_TEST_ENV_HTTP__BASE_URL", "http://localhost:9");
        let cfg = load(LoadOptions {
            config_file: Some(PathBuf::from("/nonexistent/config.yaml")),
            env_prefix: Some("MEDIUM_RESPONSES_TEST_ENV".into()),
        })
        .unwrap();
        assert_eq!(cfg.http.base_url, "http://localhost:9");
        env::remove_var("MEDIUM_RESPONSES_TEST_ENV_HTTP__BASE_URL");
    }
}

use anyhow::{Context, Result};
use common::{AgentConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf { common::default_store_path() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: default_store_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "warn".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    /// IANA name, `UTC`, or unset for the local zone.
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Detect file type by extension and load
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "toml" => Self::from_toml_file(path),
            _ => Err(anyhow::anyhow!("Unsupported config file format. Use .yaml, .yml, or .toml")),
        }
    }

    /// Resolve the config: explicit path, then `TASKDIGEST_CONFIG`, then the
    /// user config file if it exists, then defaults. API keys from the
    /// environment win over file values.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os("TASKDIGEST_CONFIG").map(PathBuf::from);
        let user_path = common::user_config_dir().join(common::CONFIG_FILE_NAME);

        let mut config = Config::default();
        if let Some(path) = explicit.map(Path::to_path_buf).or(env_path) {
            config.merge(Self::from_file(&path)?);
        } else if user_path.exists() {
            config.merge(Self::from_file(&user_path)?);
        }

        if let Ok(key) = std::env::var("TASKDIGEST_AGENT_API_KEY") {
            config.agent.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("TASKDIGEST_SCHEDULER_API_KEY") {
            config.scheduler.api_key = Some(key);
        }
        Ok(config)
    }

    /// Timezone the digest schedule is expressed in, shown next to the
    /// scheduled time.
    pub fn digest_timezone(&self) -> String {
        self.display
            .timezone
            .clone()
            .unwrap_or_else(|| common::DEFAULT_TIMEZONE.to_string())
    }

    /// Merge with another config, preferring values from other
    pub fn merge(&mut self, other: Config) {
        // Agent settings
        self.agent.url = other.agent.url;
        self.agent.agent_id = other.agent.agent_id;
        self.agent.message = other.agent.message;
        if other.agent.api_key.is_some() {
            self.agent.api_key = other.agent.api_key;
        }
        if other.agent.timeout_secs.is_some() {
            self.agent.timeout_secs = other.agent.timeout_secs;
        }

        // Scheduler settings
        self.scheduler.base_url = other.scheduler.base_url;
        self.scheduler.schedule_id = other.scheduler.schedule_id;
        self.scheduler.logs_limit = other.scheduler.logs_limit;
        self.scheduler.trigger_refresh_delay_ms = other.scheduler.trigger_refresh_delay_ms;
        if other.scheduler.api_key.is_some() {
            self.scheduler.api_key = other.scheduler.api_key;
        }
        if other.scheduler.timeout_secs.is_some() {
            self.scheduler.timeout_secs = other.scheduler.timeout_secs;
        }

        self.storage.path = other.storage.path;

        // Logging settings
        self.logging.level = other.logging.level;
        if other.logging.output.is_some() {
            self.logging.output = other.logging.output;
        }

        if other.display.timezone.is_some() {
            self.display.timezone = other.display.timezone;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "agent:\n  url: http://agent.local/run\nscheduler:\n  schedule_id: abc\n  logs_limit: 5\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.agent.url, "http://agent.local/run");
        assert_eq!(config.agent.agent_id, common::DEFAULT_AGENT_ID);
        assert_eq!(config.scheduler.schedule_id, "abc");
        assert_eq!(config.scheduler.logs_limit, 5);
        assert_eq!(config.scheduler.trigger_refresh_delay_ms, 2000);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn toml_is_supported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[display]\ntimezone = \"UTC\"\n[storage]\npath = \"/tmp/s.json\"\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.display.timezone.as_deref(), Some("UTC"));
        assert_eq!(config.storage.path, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(Config::from_file(Path::new("config.ini")).is_err());
    }

    #[test]
    fn merge_keeps_existing_optional_values() {
        let mut base = Config::default();
        base.agent.api_key = Some("k".to_string());
        base.display.timezone = Some("UTC".to_string());

        let mut other = Config::default();
        other.scheduler.schedule_id = "next".to_string();
        base.merge(other);

        assert_eq!(base.agent.api_key.as_deref(), Some("k"));
        assert_eq!(base.display.timezone.as_deref(), Some("UTC"));
        assert_eq!(base.scheduler.schedule_id, "next");
    }
}

mod api;
mod defaults;
mod validation;

use crate::cli::Args;
use crate::logs::DEFAULT_LOGS_DIRECTORY;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub use api::ApiConfig;
pub use defaults::*;
pub use validation::{expand_env_var_in_string, expand_with, normalize_endpoint};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LogsConfig {
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JsonConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default)]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_endpoint: String,
    pub stream_timeout: u64,
    pub model: String,
    pub provider: String,
    pub system_prompt: String,
    pub agent_name: String,
    pub debounce: Duration,
    pub faq_directory: PathBuf,
    pub filter: String,
    pub max_results: usize,
    pub logs_directory: PathBuf,
    pub verbose: bool,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self, String> {
        // Load JSON configuration first
        let json_config = JsonConfig::load().unwrap_or_default();
        Self::resolve(args, &json_config, |key| env::var(key).ok())
    }

    /// Resolve every setting: CLI args > env var > config file > default.
    pub fn resolve<F>(args: &Args, json_config: &JsonConfig, env_var: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_var = |key: &str| env_var(key).filter(|v| !v.is_empty());
        let expand = |value: String| expand_with(&value, |name| env_var(name));

        // Get API key (env only, never from a config file)
        let api_key = env_var("FAQ_API_KEY")
            .or_else(|| env_var("OPENAI_API_KEY"))
            .ok_or("FAQ_API_KEY (or OPENAI_API_KEY) environment variable not set")?;

        let api_endpoint = args
            .api_endpoint
            .clone()
            .or_else(|| env_var("FAQ_API_ENDPOINT"))
            .or(json_config.api.endpoint.clone())
            .map(|endpoint| normalize_endpoint(&expand(endpoint)))
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());

        let stream_timeout = env_var("FAQ_STREAM_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .or(json_config.api.stream_timeout)
            .unwrap_or_else(default_stream_timeout);

        let model = args
            .model
            .clone()
            .or_else(|| env_var("FAQ_MODEL"))
            .or(json_config.model.name.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let provider = env_var("FAQ_PROVIDER")
            .or(json_config.model.provider.clone())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

        let system_prompt = env_var("FAQ_SYSTEM_PROMPT")
            .or(json_config.model.system_prompt.clone())
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let agent_name = env_var("FAQ_AGENT_NAME")
            .or(json_config.agent.name.clone())
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string());

        let debounce_ms = env_var("FAQ_DEBOUNCE_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .or(json_config.agent.debounce_ms)
            .unwrap_or_else(default_debounce_ms);

        let faq_directory = args
            .faq_dir
            .clone()
            .or_else(|| env_var("FAQ_DIRECTORY"))
            .or(json_config.index.directory.clone())
            .map(expand)
            .unwrap_or_else(|| DEFAULT_FAQ_DIRECTORY.to_string());

        // An explicitly empty filter is meaningful (index everything)
        let filter = args
            .filter
            .clone()
            .or_else(|| env_var("FAQ_FILTER"))
            .or(json_config.index.filter.clone())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let max_results = json_config
            .index
            .max_results
            .filter(|n| *n > 0)
            .unwrap_or_else(default_max_results);

        let logs_directory = args
            .logs_dir
            .clone()
            .or_else(|| env_var("LOGS_DIRECTORY"))
            .or(json_config.logs.directory.clone())
            .map(expand)
            .unwrap_or_else(|| DEFAULT_LOGS_DIRECTORY.to_string());

        let verbose = args.verbose
            || env_var("FAQ_VERBOSE")
                .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
                .or(json_config.verbose)
                .unwrap_or(false);

        Ok(Config {
            api_key,
            api_endpoint,
            stream_timeout,
            model,
            provider,
            system_prompt,
            agent_name,
            debounce: Duration::from_millis(debounce_ms),
            faq_directory: PathBuf::from(faq_directory),
            filter,
            max_results,
            logs_directory: PathBuf::from(logs_directory),
            verbose,
        })
    }
}

pub const EXAMPLE_CONFIG: &str = r#"# faq-assistant configuration
# The API key is read from FAQ_API_KEY or OPENAI_API_KEY only.

api:
  endpoint: https://api.openai.com/v1
  stream_timeout: 30

model:
  name: gpt-4o-mini
  provider: openai
  # system_prompt: |
  #   You are a helpful assistant for a course.

agent:
  name: faq_agent
  debounce_ms: 10

index:
  directory: ./faq
  filter: data-engineering
  max_results: 5

logs:
  directory: ./logs

verbose: false
"#;

impl JsonConfig {
    pub fn load() -> Result<Self> {
        let config_paths = Self::get_config_paths();

        for path in config_paths {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        // No config file found, return default
        Ok(JsonConfig::default())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        let config = if is_yaml {
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config file: {}", path.display()))?
        } else {
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config file: {}", path.display()))?
        };

        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Current directory (highest priority - local override)
        paths.push(PathBuf::from(".faq-assistant.yaml"));
        paths.push(PathBuf::from(".faq-assistant.yml"));
        paths.push(PathBuf::from(".faq-assistant.json"));

        // 2. User's config directory (global config)
        if let Some(config_dir) = Self::user_config_dir() {
            paths.push(config_dir.join("faq-assistant.yaml"));
            paths.push(config_dir.join("faq-assistant.yml"));
            paths.push(config_dir.join("faq-assistant.json"));
        }

        paths
    }

    fn user_config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("faq-assistant"))
    }

    /// Write the example config to the user config directory. Refuses to
    /// overwrite an existing file.
    pub fn init_config() -> Result<PathBuf> {
        let config_dir = Self::user_config_dir().context("Could not determine home directory")?;
        let path = config_dir.join("faq-assistant.yaml");
        if path.exists() {
            bail!("Config file already exists: {}", path.display());
        }

        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create {}", config_dir.display()))?;
        fs::write(&path, EXAMPLE_CONFIG)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

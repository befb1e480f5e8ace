// ABOUTME: Configuration types and parsing for stolos.yml.
// ABOUTME: Handles YAML parsing, environment lookup, and the init template.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

pub const CONFIG_FILENAME: &str = "stolos.yml";
pub const CONFIG_FILENAME_ALT: &str = "stolos.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stolos/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environments: Vec<Environment>,

    /// Optional per-worker-call deadline for deployments.
    #[serde(default, with = "humantime_serde::option")]
    pub push_timeout: Option<Duration>,
}

/// One logical environment: a name and its ordered foundations.
///
/// Foundation order is both the deployment order and the rollback order.
/// The URLs are opaque to the orchestrator; duplicates are permitted.
#[derive(Debug, Clone, Deserialize)]
pub struct Environment {
    pub name: String,

    #[serde(deserialize_with = "deserialize_foundations")]
    pub foundations: NonEmpty<String>,

    #[serde(default)]
    pub skip_ssl: bool,

    #[serde(default = "default_instances")]
    pub instances: u16,

    #[serde(default)]
    pub domain: Option<String>,
}

fn default_instances() -> u16 {
    1
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Look up an environment by its logical name.
    pub fn environment(&self, name: &str) -> Result<&Environment> {
        self.environments
            .iter()
            .find(|env| env.name == name)
            .ok_or_else(|| Error::UnknownEnvironment(name.to_string()))
    }

    pub fn template() -> Self {
        Config {
            environments: vec![Environment {
                name: "sandbox".to_string(),
                foundations: NonEmpty::new("https://api.sandbox.example.com".to_string()),
                skip_ssl: false,
                instances: default_instances(),
                domain: None,
            }],
            push_timeout: None,
        }
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;
    Ok(())
}

fn template_yaml() -> &'static str {
    r#"environments:
  - name: sandbox
    foundations:
      - https://api.sandbox.example.com
    # instances: 1
    # skip_ssl: false
    # domain: apps.sandbox.example.com
# push_timeout: 15m
"#
}

fn deserialize_foundations<'de, D>(deserializer: D) -> std::result::Result<NonEmpty<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one foundation is required"))
}

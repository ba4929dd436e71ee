// crates/wstar-cli/src/config.rs
//
// CLI configuration.
// Loaded from ~/.wstar/config.toml or populated with defaults.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Snapshot file of the simulated chain. A leading `~` is expanded.
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Actor used when `--as` is not given.
    #[serde(default = "default_actor")]
    pub actor: String,

    /// Deployer of a fresh chain (`wstar init`).
    #[serde(default = "default_deployer")]
    pub deployer: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "table" or "json".
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_state_path() -> String {
    "~/.wstar/state.json".to_string()
}

fn default_actor() -> String {
    "deployer".to_string()
}

fn default_deployer() -> String {
    "deployer".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_output() -> String {
    "table".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            actor: default_actor(),
            deployer: default_deployer(),
            log_level: default_log_level(),
            output: default_output(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_home(path))?;
        let config: CliConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// The snapshot path with `~` expanded.
    pub fn state_file(&self) -> PathBuf {
        expand_home(&self.state_path)
    }
}

/// Default config location: `~/.wstar/config.toml`.
pub fn default_config_path() -> String {
    "~/.wstar/config.toml".to_string()
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.actor, "deployer");
        assert_eq!(config.output, "table");
        assert!(config.state_file().ends_with(".wstar/state.json"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "actor = \"creator\"\noutput = \"json\"\n").unwrap();
        let config = CliConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.actor, "creator");
        assert_eq!(config.output, "json");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.deployer, "deployer");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(CliConfig::load("/nonexistent/wstar/config.toml").is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/state.json"), PathBuf::from("/tmp/state.json"));
        assert_eq!(expand_home("state.json"), PathBuf::from("state.json"));
    }
}

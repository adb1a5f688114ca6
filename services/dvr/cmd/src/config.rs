//! Configuration handling for the router binary.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! `DVR_*` environment variables, then command-line flags.

use anyhow::{bail, Context, Result};
use dvr_wire::{NodeId, RELAY_NODE_ID};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// How the final forwarding table is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table
    Text,
    /// One JSON document
    Json,
}

/// Router configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// This node's ID
    pub node_id: NodeId,
    /// Relay host name or address
    pub relay_host: String,
    /// Relay TCP port
    pub relay_port: u16,
    /// Periodic advertisement interval in milliseconds
    pub update_interval_ms: u64,
    /// Output format for the forwarding table
    pub output: OutputFormat,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            node_id: 0,
            relay_host: "localhost".to_string(),
            relay_port: 2227,
            update_interval_ms: 1000,
            output: OutputFormat::Text,
        }
    }
}

/// Values given on the command line; `None` leaves the lower layers alone
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// `--node-id`
    pub node_id: Option<NodeId>,
    /// `--relay-host`
    pub relay_host: Option<String>,
    /// `--relay-port`
    pub relay_port: Option<u16>,
    /// `--update-interval`, stored in whole milliseconds
    pub update_interval: Option<Duration>,
    /// `--output`
    pub output: Option<OutputFormat>,
}

impl RouterSettings {
    /// Load settings from every source and validate the result
    pub fn load(config_path: Option<&Path>, overrides: &SettingsOverrides) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };

        settings.apply_environment_overrides(|key| std::env::var(key).ok())?;
        settings.apply_overrides(overrides);
        settings.validate()?;

        info!(
            "Final router configuration: node_id={}, relay={}:{}, update_interval={}ms",
            settings.node_id, settings.relay_host, settings.relay_port, settings.update_interval_ms
        );
        Ok(settings)
    }

    /// Read a YAML file on top of the defaults.
    ///
    /// A missing file falls back to the defaults; a file that does not parse
    /// is an error.
    pub fn load_from_file<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let path = config_path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {:?} not found, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config file {:?}", path))
            }
        };

        let settings: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(settings)
    }

    /// Apply `DVR_*` variables looked up through `lookup`
    fn apply_environment_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("DVR_NODE_ID") {
            self.node_id = value
                .parse()
                .with_context(|| format!("Invalid DVR_NODE_ID: {:?}", value))?;
            info!("Node ID overridden by environment: {}", self.node_id);
        }

        if let Some(value) = lookup("DVR_RELAY_HOST") {
            self.relay_host = value;
            info!("Relay host overridden by environment: {}", self.relay_host);
        }

        if let Some(value) = lookup("DVR_RELAY_PORT") {
            self.relay_port = value
                .parse()
                .with_context(|| format!("Invalid DVR_RELAY_PORT: {:?}", value))?;
            info!("Relay port overridden by environment: {}", self.relay_port);
        }

        if let Some(value) = lookup("DVR_UPDATE_INTERVAL_MS") {
            self.update_interval_ms = value
                .parse()
                .with_context(|| format!("Invalid DVR_UPDATE_INTERVAL_MS: {:?}", value))?;
            info!("Update interval overridden by environment: {}ms", self.update_interval_ms);
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(node_id) = overrides.node_id {
            self.node_id = node_id;
        }
        if let Some(host) = &overrides.relay_host {
            self.relay_host = host.clone();
        }
        if let Some(port) = overrides.relay_port {
            self.relay_port = port;
        }
        if let Some(interval) = overrides.update_interval {
            self.update_interval_ms = interval.as_millis() as u64;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
    }

    /// Reject settings a session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.update_interval_ms == 0 {
            bail!("update interval must be greater than zero");
        }
        if self.node_id >= RELAY_NODE_ID {
            bail!(
                "node id {} is out of range, must be below the relay id {}",
                self.node_id,
                RELAY_NODE_ID
            );
        }
        if self.relay_host.is_empty() {
            bail!("relay host must not be empty");
        }
        Ok(())
    }

    /// Advertisement interval as a duration
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let settings = RouterSettings::default();
        assert_eq!(settings.node_id, 0);
        assert_eq!(settings.relay_host, "localhost");
        assert_eq!(settings.relay_port, 2227);
        assert_eq!(settings.update_interval(), Duration::from_millis(1000));
        assert_eq!(settings.output, OutputFormat::Text);
    }

    #[test]
    fn test_load_from_file() {
        let yaml_content = r#"
node_id: 3
relay_host: relay.example
update_interval_ms: 250
output: json
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let settings = RouterSettings::load_from_file(temp_file.path()).unwrap();

        assert_eq!(settings.node_id, 3);
        assert_eq!(settings.relay_host, "relay.example");
        assert_eq!(settings.relay_port, 2227);
        assert_eq!(settings.update_interval_ms, 250);
        assert_eq!(settings.output, OutputFormat::Json);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = RouterSettings::load_from_file(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(settings, RouterSettings::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"relay_port: [not, a, port]\n").unwrap();

        assert!(RouterSettings::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_layer_precedence() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"node_id: 1\nrelay_port: 4000\nupdate_interval_ms: 500\n")
            .unwrap();

        let mut settings = RouterSettings::load_from_file(temp_file.path()).unwrap();
        settings
            .apply_environment_overrides(env(&[("DVR_RELAY_PORT", "5000"), ("DVR_NODE_ID", "2")]))
            .unwrap();
        settings.apply_overrides(&SettingsOverrides {
            node_id: Some(7),
            update_interval: Some(Duration::from_millis(1500)),
            ..Default::default()
        });

        assert_eq!(settings.node_id, 7);
        assert_eq!(settings.relay_port, 5000);
        assert_eq!(settings.update_interval_ms, 1500);
        assert_eq!(settings.relay_host, "localhost");
    }

    #[test]
    fn test_invalid_environment_value() {
        let mut settings = RouterSettings::default();
        let result = settings.apply_environment_overrides(env(&[("DVR_RELAY_PORT", "seventy")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let mut settings = RouterSettings::default();
        assert!(settings.validate().is_ok());

        settings.update_interval_ms = 0;
        assert!(settings.validate().is_err());

        settings.update_interval_ms = 1000;
        settings.node_id = RELAY_NODE_ID;
        assert!(settings.validate().is_err());

        settings.node_id = 99;
        assert!(settings.validate().is_ok());
    }
}

//! Configuration resolution for camrelay.
//!
//! Resolution order (lowest to highest priority):
//! 1. Built-in defaults
//! 2. Config file (`--config`, else `~/.config/camrelay/relay.json` if present)
//! 3. Environment variables (`CAMRELAY_*`)
//! 4. CLI arguments (applied by the binary)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Complete relay configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pin: PinConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_payload_bytes: usize,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_payload_bytes: 10 * 1024 * 1024, // 10 MB
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Where the shared PIN lives.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PinPersistence {
    /// Process lifetime only.
    #[default]
    Memory,
    /// Write-through JSON file; survives restarts.
    File,
}

/// What to do when a client supplies a PIN but none has been set yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnsetPinPolicy {
    /// Refuse the request (401).
    #[default]
    Reject,
    /// Ignore the supplied PIN and grant access.
    Allow,
    /// Adopt the supplied PIN as the active one and grant access.
    Adopt,
}

impl std::str::FromStr for UnsetPinPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "allow" => Ok(Self::Allow),
            "adopt" => Ok(Self::Adopt),
            other => Err(Error::Config(format!(
                "unknown unset-PIN policy '{other}' (expected reject, allow or adopt)"
            ))),
        }
    }
}

/// PIN gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PinConfig {
    pub persistence: PinPersistence,
    /// PIN file location; defaults to [`default_pin_path`] when persistence is `file`.
    pub path: Option<PathBuf>,
    pub unset_policy: UnsetPinPolicy,
}

impl PinConfig {
    /// The file the PIN is persisted to, if file persistence is enabled.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>> {
        match self.persistence {
            PinPersistence::Memory => Ok(None),
            PinPersistence::File => self
                .path
                .clone()
                .or_else(default_pin_path)
                .map(Some)
                .ok_or_else(|| {
                    Error::Config("Cannot determine a PIN file location; set pin.path".into())
                }),
        }
    }
}

impl Config {
    /// Reject configurations the relay cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.server.max_payload_bytes == 0 {
            return Err(Error::Config(
                "server.max_payload_bytes must be greater than zero".into(),
            ));
        }
        self.pin.resolved_path()?;
        Ok(())
    }
}

/// Load configuration with hierarchical resolution.
///
/// An explicitly given `path` must exist; the global config file is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_config_file(path)?,
        None => match global_config_path() {
            Some(global) if global.exists() => load_config_file(&global)?,
            _ => Config::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("camrelay").join("relay.json"))
}

/// Get the default location of the persisted PIN.
pub fn default_pin_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("camrelay").join("pin.json"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

/// Apply `CAMRELAY_*` overrides. Unparseable values are ignored.
fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(addr) = var("CAMRELAY_ADDR").and_then(|v| v.parse().ok()) {
        config.server.addr = addr;
    }
    if let Some(n) = var("CAMRELAY_MAX_PAYLOAD_BYTES").and_then(|v| v.parse().ok()) {
        config.server.max_payload_bytes = n;
    }
    if let Some(level) = var("CAMRELAY_LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(path) = var("CAMRELAY_PIN_FILE") {
        config.pin.persistence = PinPersistence::File;
        config.pin.path = Some(PathBuf::from(path));
    }
    if let Some(policy) = var("CAMRELAY_UNSET_PIN_POLICY").and_then(|v| v.parse().ok()) {
        config.pin.unset_policy = policy;
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_are_memory_pin_and_reject_policy() {
        let config = Config::default();
        assert_eq!(config.pin.persistence, PinPersistence::Memory);
        assert_eq!(config.pin.unset_policy, UnsetPinPolicy::Reject);
        assert_eq!(config.server.addr.port(), 3000);
        assert_eq!(config.server.max_payload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.json");
        std::fs::write(
            &path,
            r#"{"pin": {"persistence": "file", "path": "/tmp/pin.json", "unset_policy": "adopt"}}"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.pin.persistence, PinPersistence::File);
        assert_eq!(config.pin.path, Some(PathBuf::from("/tmp/pin.json")));
        assert_eq!(config.pin.unset_policy, UnsetPinPolicy::Adopt);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.json")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn file_errors_are_config_errors_naming_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = load_config_file(&missing).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("absent.json"), "{err}");

        let bad = dir.path().join("broken.json");
        std::fs::write(&bad, r#"{"server": {"addr": 42}}"#).unwrap();
        let err = load_config_file(&bad).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"), "{err}");
        assert!(err.to_string().contains("broken.json"), "{err}");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_config_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("CAMRELAY_ADDR", "127.0.0.1:8080"),
            ("CAMRELAY_PIN_FILE", "/var/lib/camrelay/pin.json"),
            ("CAMRELAY_UNSET_PIN_POLICY", "allow"),
            ("CAMRELAY_MAX_PAYLOAD_BYTES", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| env.get(k).map(ToString::to_string));

        assert_eq!(config.server.addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.pin.persistence, PinPersistence::File);
        assert_eq!(
            config.pin.path,
            Some(PathBuf::from("/var/lib/camrelay/pin.json"))
        );
        assert_eq!(config.pin.unset_policy, UnsetPinPolicy::Allow);
        assert_eq!(config.server.max_payload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("ADOPT".parse::<UnsetPinPolicy>().unwrap(), UnsetPinPolicy::Adopt);
        assert!("maybe".parse::<UnsetPinPolicy>().is_err());
    }

    #[test]
    fn memory_persistence_has_no_path() {
        assert_eq!(PinConfig::default().resolved_path().unwrap(), None);
    }

    #[test]
    fn zero_payload_limit_is_rejected() {
        let mut config = Config::default();
        config.server.max_payload_bytes = 0;
        assert!(config.validate().is_err());
    }
}

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming the editor executable.
pub const ENV_EXECUTABLE_PATH: &str = "CODE_SERVER_PATH";
/// Environment variable naming the scheme and host used in access URLs.
pub const ENV_BASE_URL: &str = "CODE_SERVER_BASE_URL";
/// Environment variable for the first candidate port.
pub const ENV_PORT_START: &str = "CODE_SERVER_PORT_START";
/// Environment variable for the last candidate port (inclusive).
pub const ENV_PORT_END: &str = "CODE_SERVER_PORT_END";
/// Environment variable for the editor's persistent state directory.
pub const ENV_DATA_DIR: &str = "CODE_SERVER_DATA_DIR";
/// Environment variable for the liveness probe timeout in milliseconds.
pub const ENV_PROBE_TIMEOUT_MS: &str = "CODE_SERVER_PROBE_TIMEOUT_MS";
/// Environment variable for the startup grace period in milliseconds.
pub const ENV_STARTUP_GRACE_MS: &str = "CODE_SERVER_STARTUP_GRACE_MS";

const DEFAULT_EXECUTABLE_PATH: &str = "code-server";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1";
const DEFAULT_PORT_START: u16 = 8080;
const DEFAULT_PORT_END: u16 = 8180;
const DEFAULT_PROBE_TIMEOUT_MS: u64 = 100;
const DEFAULT_STARTUP_GRACE_MS: u64 = 500;

/// Configuration for the supervised editor process.
///
/// The record is built once, either from the environment with
/// [`EditorConfig::from_env`] or from a JSON fragment of the host's own
/// configuration with [`EditorConfig::parse_from_str`], and is read-only for
/// the lifetime of the supervisor.
///
/// # Examples
///
/// Pinning the editor to a single port:
///
/// ```
/// use editor_supervisor::config::EditorConfig;
///
/// let config = EditorConfig {
///     port_start: 8443,
///     port_end: 8443,
///     ..EditorConfig::default()
/// };
/// assert!(config.port_range().unwrap().is_pinned());
/// ```
///
/// Resolving from an arbitrary lookup instead of the process environment:
///
/// ```
/// use editor_supervisor::config::EditorConfig;
/// use std::collections::HashMap;
///
/// let mut env = HashMap::new();
/// env.insert("CODE_SERVER_PORT_START", "9000");
/// env.insert("CODE_SERVER_PORT_END", "9010");
///
/// let config = EditorConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
/// assert_eq!(config.port_start, 9000);
/// assert_eq!(config.executable_path, "code-server");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Executable to launch. Either an absolute path or a command in `PATH`.
    pub executable_path: String,

    /// Scheme and host used to build access URLs, e.g. `http://127.0.0.1`.
    /// The instance port is filled in at request time.
    pub base_url: String,

    /// First candidate port.
    pub port_start: u16,

    /// Last candidate port, inclusive. Equal to `port_start` pins the editor
    /// to that single port.
    pub port_end: u16,

    /// Persistent state directory passed to the editor as its user data dir.
    pub data_dir: PathBuf,

    /// Upper bound for one liveness probe, in milliseconds.
    pub probe_timeout_ms: u64,

    /// Time a freshly launched editor must stay up, and within which it must
    /// accept a connection, in milliseconds.
    pub startup_grace_ms: u64,

    /// Additional arguments appended to the launch command line.
    pub extra_args: Vec<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            executable_path: DEFAULT_EXECUTABLE_PATH.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            port_start: DEFAULT_PORT_START,
            port_end: DEFAULT_PORT_END,
            data_dir: default_data_dir(),
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            startup_grace_ms: DEFAULT_STARTUP_GRACE_MS,
            extra_args: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// Resolves the configuration from the process environment.
    ///
    /// Unset variables fall back to their defaults. A variable that is set to
    /// a malformed value is an error rather than being silently ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigInvalid`] if:
    /// * A port or millisecond variable is not a number in range
    /// * The resolved configuration fails [`validate_config`](super::validate_config)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration using `lookup` in place of the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_EXECUTABLE_PATH) {
            config.executable_path = path;
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(value) = lookup(ENV_PORT_START) {
            config.port_start = parse_number(ENV_PORT_START, &value)?;
        }
        if let Some(value) = lookup(ENV_PORT_END) {
            config.port_end = parse_number(ENV_PORT_END, &value)?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_PROBE_TIMEOUT_MS) {
            config.probe_timeout_ms = parse_number(ENV_PROBE_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_STARTUP_GRACE_MS) {
            config.startup_grace_ms = parse_number(ENV_STARTUP_GRACE_MS, &value)?;
        }

        super::validate_config(&config)?;
        Ok(config)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// Omitted fields take their defaults, so `{}` is a valid configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] if the string is not valid JSON for
    /// this record, and [`Error::ConfigInvalid`] if it parses but fails
    /// validation.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))?;
        super::validate_config(&config)?;
        Ok(config)
    }

    /// The configured candidate ports.
    pub fn port_range(&self) -> Result<crate::server::PortRange> {
        crate::server::PortRange::new(self.port_start, self.port_end)
    }

    /// Liveness probe timeout.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Startup grace period.
    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        Error::ConfigInvalid(format!("{} must be a number, got '{}'", key, value))
    })
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".vibe-kanban").join("code-server"))
        .unwrap_or_else(|| std::env::temp_dir().join("vibe-kanban-code-server"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EditorConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.executable_path, "code-server");
        assert_eq!(config.base_url, "http://127.0.0.1");
        assert_eq!(config.port_start, 8080);
        assert_eq!(config.port_end, 8180);
        assert_eq!(config.probe_timeout(), Duration::from_millis(100));
        assert_eq!(config.startup_grace(), Duration::from_millis(500));
        assert_eq!(config.data_dir, default_data_dir());
    }

    #[test]
    fn test_env_overrides() {
        let config = EditorConfig::from_lookup(lookup_from(&[
            (ENV_EXECUTABLE_PATH, "/opt/code-server/bin/code-server"),
            (ENV_BASE_URL, "http://100.64.0.7"),
            (ENV_PORT_START, "9000"),
            (ENV_PORT_END, " 9000 "),
            (ENV_DATA_DIR, "/var/lib/editor"),
            (ENV_PROBE_TIMEOUT_MS, "250"),
        ]))
        .unwrap();

        assert_eq!(config.executable_path, "/opt/code-server/bin/code-server");
        assert_eq!(config.base_url, "http://100.64.0.7");
        assert_eq!(config.port_start, 9000);
        assert_eq!(config.port_end, 9000);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/editor"));
        assert_eq!(config.probe_timeout_ms, 250);
    }

    #[test]
    fn test_non_numeric_port_is_rejected() {
        let err = EditorConfig::from_lookup(lookup_from(&[(ENV_PORT_START, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(msg) if msg.contains(ENV_PORT_START)));

        let err = EditorConfig::from_lookup(lookup_from(&[(ENV_PORT_END, "70000")]))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn test_parse_partial_json() {
        let config = EditorConfig::parse_from_str(
            r#"{
                "executablePath": "/usr/local/bin/code-server",
                "portStart": 8443,
                "portEnd": 8443,
                "extraArgs": ["--disable-telemetry"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.executable_path, "/usr/local/bin/code-server");
        assert_eq!(config.base_url, "http://127.0.0.1");
        assert_eq!(config.port_start, 8443);
        assert_eq!(config.extra_args, vec!["--disable-telemetry"]);
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = EditorConfig::parse_from_str(r#"{"portStart": "abc"}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}

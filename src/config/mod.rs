//! Configuration module for the editor supervisor.
//!
//! This module resolves the immutable [`EditorConfig`] record the supervisor
//! reads for its whole lifetime. Values come from `CODE_SERVER_*` environment
//! variables with documented defaults, or from a JSON fragment embedded in
//! the host application's own configuration.
//!
//! # Examples
//!
//! Resolving from the environment:
//!
//! ```no_run
//! use editor_supervisor::config::EditorConfig;
//!
//! let config = EditorConfig::from_env().unwrap();
//! println!("Launching {} on ports {}-{}", config.executable_path, config.port_start, config.port_end);
//! ```
//!
//! Parsing a fragment of the host configuration:
//!
//! ```
//! use editor_supervisor::config::EditorConfig;
//!
//! let config = EditorConfig::parse_from_str(r#"{ "baseUrl": "http://10.0.0.5", "portStart": 8443, "portEnd": 8443 }"#).unwrap();
//! assert_eq!(config.base_url, "http://10.0.0.5");
//! ```
mod parser;
pub mod validator;

pub use parser::{
    EditorConfig, ENV_BASE_URL, ENV_DATA_DIR, ENV_EXECUTABLE_PATH, ENV_PORT_END, ENV_PORT_START,
    ENV_PROBE_TIMEOUT_MS, ENV_STARTUP_GRACE_MS,
};
pub use validator::validate_config;

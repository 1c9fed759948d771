/// Error handling module for the editor supervisor.
///
/// This module defines the error types returned by the supervisor and its
/// collaborators. Every error reaching a caller of
/// [`EditorSupervisor::ensure_running`](crate::EditorSupervisor::ensure_running)
/// is one of these variants; failures to kill a discarded process are logged
/// and never appear here.
///
/// # Example
///
/// ```
/// use editor_supervisor::error::{Error, Result};
///
/// fn describe(result: Result<String>) -> String {
///     match result {
///         Ok(url) => format!("open {}", url),
///         Err(Error::NoPortAvailable { start, end }) => {
///             format!("all ports between {} and {} are busy, try again later", start, end)
///         }
///         Err(Error::Spawn(msg)) => format!("editor failed to start: {}", msg),
///         Err(e) => format!("error: {}", e),
///     }
/// }
/// ```
use thiserror::Error;

/// Errors that can occur while supervising the editor process.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to parse a configuration fragment.
    ///
    /// This error occurs when:
    /// - The embedded JSON is malformed
    /// - Field types are incorrect
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A configuration value is syntactically or semantically invalid.
    ///
    /// This error occurs when:
    /// - A port or millisecond value is not numeric
    /// - The port range is inverted (start greater than end)
    /// - The base URL cannot be parsed or has no host
    /// - The executable path is empty
    ///
    /// It is fatal to construction and never retried.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Every port in the configured range was occupied at probe time.
    ///
    /// This is transient; the caller may retry later.
    #[error("No available ports in range {start}-{end}")]
    NoPortAvailable {
        /// First port of the range
        start: u16,
        /// Last port of the range (inclusive)
        end: u16,
    },

    /// The editor could not be launched or did not become healthy.
    ///
    /// This error occurs when:
    /// - The executable does not exist or is not runnable
    /// - The data directory cannot be created
    /// - The process exits during the startup grace period
    /// - The bound port never accepts connections within the grace period
    ///
    /// The supervisor is left without an instance so the next call retries.
    #[error("Failed to spawn editor: {0}")]
    Spawn(String),

    /// Any other error not covered by the above categories.
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type for supervisor operations.
pub type Result<T> = std::result::Result<T, Error>;

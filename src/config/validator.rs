use crate::config::EditorConfig;
use crate::error::{Error, Result};
use url::Url;

/// Validates the executable setting
pub fn validate_executable(config: &EditorConfig) -> Result<()> {
    if config.executable_path.trim().is_empty() {
        return Err(Error::ConfigInvalid("Editor executable path is empty".to_string()));
    }

    // Existence is not checked here; a missing binary surfaces as a spawn error
    // on first use, which is where the host can report it.

    Ok(())
}

/// Validates the base URL used to build access URLs
pub fn validate_base_url(config: &EditorConfig) -> Result<()> {
    let url = Url::parse(&config.base_url).map_err(|e| {
        Error::ConfigInvalid(format!("Invalid base URL '{}': {}", config.base_url, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::ConfigInvalid(format!(
            "Base URL '{}' must use http or https",
            config.base_url
        )));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::ConfigInvalid(format!(
            "Base URL '{}' has no host",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates the candidate port range
pub fn validate_port_range(config: &EditorConfig) -> Result<()> {
    if config.port_start == 0 {
        return Err(Error::ConfigInvalid("Port range cannot start at 0".to_string()));
    }

    config.port_range()?;

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &EditorConfig) -> Result<()> {
    validate_executable(config)?;
    validate_base_url(config)?;
    validate_port_range(config)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EditorConfig::default()).is_ok());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let config = EditorConfig {
            port_start: 9000,
            port_end: 8999,
            ..EditorConfig::default()
        };
        assert!(matches!(validate_config(&config), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn test_bad_base_urls_are_rejected() {
        for base_url in ["not a url", "ftp://127.0.0.1", "unix:/tmp/socket"] {
            let config = EditorConfig {
                base_url: base_url.to_string(),
                ..EditorConfig::default()
            };
            assert!(
                matches!(validate_config(&config), Err(Error::ConfigInvalid(_))),
                "{} should be rejected",
                base_url
            );
        }
    }

    #[test]
    fn test_empty_executable_is_rejected() {
        let config = EditorConfig {
            executable_path: "  ".to_string(),
            ..EditorConfig::default()
        };
        assert!(validate_executable(&config).is_err());
    }
}

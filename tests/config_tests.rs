use editor_supervisor::config::{validate_config, EditorConfig};
use editor_supervisor::error::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;

#[test]
fn test_parse_config() -> Result<()> {
    let config_str = r#"{
        "executablePath": "/home/dev/bin/code-server",
        "baseUrl": "http://100.124.29.25",
        "portStart": 8080,
        "portEnd": 8180,
        "dataDir": "/home/dev/.vibe-kanban/code-server",
        "probeTimeoutMs": 150,
        "startupGraceMs": 750
    }"#;

    let config = EditorConfig::parse_from_str(config_str)?;

    assert_eq!(config.executable_path, "/home/dev/bin/code-server");
    assert_eq!(config.base_url, "http://100.124.29.25");
    assert_eq!(config.port_start, 8080);
    assert_eq!(config.port_end, 8180);
    assert_eq!(
        config.data_dir,
        PathBuf::from("/home/dev/.vibe-kanban/code-server")
    );
    assert_eq!(config.probe_timeout_ms, 150);
    assert_eq!(config.startup_grace_ms, 750);
    assert!(config.extra_args.is_empty());

    Ok(())
}

#[test]
fn test_empty_object_uses_defaults() -> Result<()> {
    let config = EditorConfig::parse_from_str("{}")?;
    let defaults = EditorConfig::default();

    assert_eq!(config, defaults);
    assert!(!config.port_range()?.is_pinned());

    Ok(())
}

#[test]
fn test_validate_config() -> Result<()> {
    validate_config(&EditorConfig::default())?;

    let pinned = EditorConfig {
        port_start: 8080,
        port_end: 8080,
        ..EditorConfig::default()
    };
    validate_config(&pinned)?;

    let inverted = EditorConfig {
        port_start: 8181,
        port_end: 8180,
        ..EditorConfig::default()
    };
    assert!(matches!(
        validate_config(&inverted),
        Err(Error::ConfigInvalid(_))
    ));

    Ok(())
}

#[test]
fn test_inverted_range_in_json_is_invalid() {
    let err = EditorConfig::parse_from_str(r#"{ "portStart": 9000, "portEnd": 8000 }"#)
        .unwrap_err();
    assert!(matches!(err, Error::ConfigInvalid(_)));
}

#[test]
fn test_resolve_from_lookup() -> Result<()> {
    let mut env = HashMap::new();
    env.insert("CODE_SERVER_PATH", "/opt/code-server/bin/code-server");
    env.insert("CODE_SERVER_PORT_START", "8443");
    env.insert("CODE_SERVER_PORT_END", "8443");
    env.insert("CODE_SERVER_STARTUP_GRACE_MS", "1000");

    let config = EditorConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))?;

    assert_eq!(config.executable_path, "/opt/code-server/bin/code-server");
    assert!(config.port_range()?.is_pinned());
    assert_eq!(config.startup_grace_ms, 1000);
    assert_eq!(config.probe_timeout_ms, 100);

    let err = EditorConfig::from_lookup(|key| {
        (key == "CODE_SERVER_PROBE_TIMEOUT_MS").then(|| "fast".to_string())
    })
    .unwrap_err();
    assert!(matches!(err, Error::ConfigInvalid(_)));

    Ok(())
}

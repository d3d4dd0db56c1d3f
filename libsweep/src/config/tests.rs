use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::default();

    // Verify default output settings
    assert_eq!(config.output.format, OutputFormat::Pretty);
    assert_eq!(config.output.color, ColorChoice::Auto);

    // Verify default network settings
    assert_eq!(config.network.timeout, 30);
    assert_eq!(config.network.max_idle_per_host, 10);

    // Verify default clean settings
    assert_eq!(config.clean.grace, "0s");
    assert_eq!(config.clean.keep, 0);
    assert!(!config.clean.allow_tagged);
    assert!(!config.clean.recursive);
    assert_eq!(config.clean.concurrency, DEFAULT_CONCURRENCY);
}

#[test]
fn test_from_str_empty_yaml() {
    let config = Config::from_yaml_str("").unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_from_str_partial_yaml() {
    let yaml = r#"
output:
  format: json
network:
  timeout: 60
clean:
  keep: 3
"#;
    let config = Config::from_yaml_str(yaml).unwrap();

    assert_eq!(config.output.format, OutputFormat::Json);
    assert_eq!(config.network.timeout, 60);
    assert_eq!(config.clean.keep, 3);

    // Everything else keeps its default
    assert_eq!(config.output.color, ColorChoice::Auto);
    assert_eq!(config.network.max_idle_per_host, 10);
    assert_eq!(config.clean.grace, "0s");
    assert_eq!(config.clean.concurrency, DEFAULT_CONCURRENCY);
}

#[test]
fn test_from_str_full_yaml() {
    let yaml = r#"
output:
  format: yaml
  color: never
network:
  timeout: 10
  max_idle_per_host: 2
clean:
  grace: 30days
  keep: 5
  allow_tagged: true
  recursive: true
  concurrency: 4
"#;
    let config = Config::from_yaml_str(yaml).unwrap();

    assert_eq!(config.output.format, OutputFormat::Yaml);
    assert_eq!(config.output.color, ColorChoice::Never);
    assert_eq!(config.network.timeout, 10);
    assert_eq!(config.network.max_idle_per_host, 2);
    assert_eq!(config.clean.keep, 5);
    assert!(config.clean.allow_tagged);
    assert!(config.clean.recursive);
    assert_eq!(config.clean.concurrency, 4);
    assert_eq!(
        config.clean.grace_duration().unwrap(),
        Duration::from_secs(30 * 24 * 60 * 60)
    );
}

#[test]
fn test_from_str_invalid_yaml() {
    let result = Config::from_yaml_str("output: { format: invalid }");
    assert!(result.is_err());
}

#[test]
fn test_from_str_invalid_grace() {
    let result = Config::from_yaml_str("clean:\n  grace: soon\n");
    assert!(matches!(result.unwrap_err(), SweepError::Config { .. }));
}

#[test]
fn test_from_str_unknown_field() {
    // config-rs ignores unknown fields
    let result = Config::from_yaml_str("unknown_field: true");
    assert!(result.is_ok());
}

#[test]
fn test_grace_duration_default_is_zero() {
    assert_eq!(
        Config::default().clean.grace_duration().unwrap(),
        Duration::ZERO
    );
}

#[test]
fn test_client_config_from_network_section() {
    let config = Config::from_yaml_str("network:\n  timeout: 5\n  max_idle_per_host: 1\n").unwrap();
    let client = config.client_config();

    assert_eq!(client.timeout_seconds, 5);
    assert_eq!(client.max_idle_per_host, 1);
}

#[test]
fn test_load_without_path_returns_defaults() {
    assert_eq!(Config::load(None).unwrap(), Config::default());
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "clean:\n  keep: 7\n  grace: 48h").unwrap();

    let config = Config::load(Some(file.path())).unwrap();

    assert_eq!(config.clean.keep, 7);
    assert_eq!(
        config.clean.grace_duration().unwrap(),
        Duration::from_secs(48 * 60 * 60)
    );
}

#[test]
fn test_load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load(Some(dir.path().join("missing.yaml").as_path()));

    match result.unwrap_err() {
        SweepError::Config { path, .. } => {
            assert!(path.unwrap().ends_with("missing.yaml"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

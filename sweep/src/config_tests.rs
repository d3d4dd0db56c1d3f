use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_config_path_uses_env_var() {
    let temp_dir = tempfile::tempdir().unwrap();
    let custom = temp_dir.path().join("custom.yaml");
    let custom_str = custom.to_str().unwrap().to_string();

    let result = config_path_with(|key| (key == CONFIG_ENV).then(|| custom_str.clone()));
    assert_eq!(result, custom);
}

#[test]
fn test_config_path_default() {
    let result = config_path_with(no_env);
    assert!(result.ends_with("config.yaml"));
    if dirs::config_dir().is_some() {
        assert!(result.ends_with("sweep/config.yaml"));
    }
}

#[test]
fn test_empty_env_var_falls_back_to_default() {
    let result = config_path_with(|_| Some(String::new()));
    assert!(result.ends_with("config.yaml"));
}

#[test]
fn test_credentials_path_uses_env_var() {
    let result = credentials_path_with(|key| {
        (key == CREDENTIALS_ENV).then(|| "/tmp/creds.toml".to_string())
    });
    assert_eq!(result, PathBuf::from("/tmp/creds.toml"));
}

#[test]
fn test_credentials_path_ignores_config_env() {
    let result = credentials_path_with(|key| {
        (key == CONFIG_ENV).then(|| "/tmp/config.yaml".to_string())
    });
    assert!(result.ends_with("credentials.toml"));
}

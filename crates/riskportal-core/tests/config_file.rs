//! Config persistence on a real filesystem.

use riskportal_core::{Config, ConfigError};

#[test]
fn missing_file_is_created_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let cfg = Config::load_from(&path).unwrap();
    assert_eq!(cfg, Config::default());
    assert!(path.exists());
}

#[test]
fn set_values_survive_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut cfg = Config::load_from(&path).unwrap();
    cfg.set("api.base_url", "https://portal.example.com").unwrap();
    cfg.set("upload.max_file_mb", "50").unwrap();
    cfg.save_to(&path).unwrap();

    let reloaded = Config::load_from(&path).unwrap();
    assert_eq!(reloaded.api.base_url, "https://portal.example.com");
    assert_eq!(reloaded.upload.max_file_mb, 50);
    assert_eq!(reloaded.get("upload.max_file_mb").as_deref(), Some("50"));
}

#[test]
fn broken_files_are_reported_not_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[api\nbase_url = ").unwrap();

    assert!(matches!(
        Config::load_from(&path),
        Err(ConfigError::LoadFailed { .. })
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[api\nbase_url = ");
}

#[test]
fn invalid_values_on_disk_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[auth]\nrole = \"Admin\"\n").unwrap();

    match Config::load_from(&path) {
        Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "auth.role"),
        other => panic!("expected invalid auth.role, got {other:?}"),
    }
}

use places_core::{default_log_level, init_from_config, logging_status, CoreConfig};

#[test]
fn config_without_level_starts_at_build_default() {
    let dir = tempfile::tempdir().expect("temp dir");
    let raw = format!(
        r#"{{ "logging": {{ "dir": {} }} }}"#,
        serde_json::to_string(&dir.path()).unwrap()
    );
    let config = CoreConfig::from_json_str(&raw).expect("config");
    assert_eq!(config.logging.level, None);

    assert_eq!(init_from_config(&config.logging), Ok(true));
    assert_eq!(init_from_config(&config.logging), Ok(true));

    let (level, active_dir) = logging_status().expect("logging active");
    assert_eq!(level, default_log_level());
    assert_eq!(active_dir, dir.path());
}

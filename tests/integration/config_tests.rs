use bytedupe::config::{Config, ConfigError};
use bytedupe::duplicates::Concurrency;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

// Each env test uses its own prefix so parallel tests never see each
// other's variables.

#[test]
fn test_config_load_defaults() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config = Config::from_figment(&figment).unwrap();

    assert_eq!(config.threads, 1);
    assert!(!config.follow_symlinks);
    assert!(!config.include_manifests);
    assert!(config.ignore_patterns.is_empty());
    assert_eq!(config.concurrency().unwrap(), Concurrency::Sequential);
}

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
threads = 0
follow_symlinks = true
include_manifests = true
ignore_patterns = ["target/", "*.tmp"]
include_patterns = ['\.jpe?g$']
"#,
    )
    .unwrap();

    let config = Config::load(Some(path.as_path())).unwrap();

    assert_eq!(config.threads, 0);
    assert_eq!(config.concurrency().unwrap(), Concurrency::Available);
    assert!(config.follow_symlinks);
    assert!(config.include_manifests);
    assert_eq!(config.ignore_patterns, vec!["target/", "*.tmp"]);
    assert_eq!(config.include_patterns, vec![r"\.jpe?g$"]);
    assert!(config.exclude_patterns.is_empty());
}

#[test]
fn test_config_partial_toml_keeps_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "follow_symlinks = true\n").unwrap();

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&path));
    let config = Config::from_figment(&figment).unwrap();

    assert!(config.follow_symlinks);
    assert_eq!(config.threads, 1);
}

#[test]
fn test_config_env_overrides_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "threads = 2\n").unwrap();

    std::env::set_var("BDTEST_OVERRIDE_THREADS", "8");
    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("BDTEST_OVERRIDE_").split("__"));
    let config = Config::from_figment(&figment);
    std::env::remove_var("BDTEST_OVERRIDE_THREADS");

    assert_eq!(config.unwrap().threads, 8);
}

#[test]
fn test_config_non_numeric_threads() {
    std::env::set_var("BDTEST_BADTHREADS_THREADS", "lots");
    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("BDTEST_BADTHREADS_"));
    let result = Config::from_figment(&figment);
    std::env::remove_var("BDTEST_BADTHREADS_THREADS");

    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_config_negative_threads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "threads = -4\n").unwrap();

    let result = Config::load(Some(path.as_path()));
    assert!(matches!(result, Err(ConfigError::InvalidThreads(-4))));
}

#[test]
fn test_config_bad_regex() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "exclude_patterns = ['(']\n").unwrap();

    let result = Config::load(Some(path.as_path()));
    assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
}

#[test]
fn test_config_invalid_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "this is not = = valid toml").unwrap();

    let result = Config::load(Some(path.as_path()));
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_config_wrong_type() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "follow_symlinks = \"sometimes\"\n").unwrap();

    assert!(Config::load(Some(path.as_path())).is_err());
}

use clap::Parser;
use modelscan::cli::Cli;
use modelscan::config::{Config, ConfigError};
use std::fs;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all MODELSCAN_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("MODELSCAN_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "ttl_minutes = 15\nfollow_symlinks = true\nskip_hidden = true\n",
    )
    .unwrap();

    let config = Config::load_from_path(path);

    assert_eq!(config.ttl_minutes, 15);
    assert_eq!(config.ttl(), Duration::from_secs(900));
    assert!(config.follow_symlinks);
    assert!(config.skip_hidden);
    assert!(!config.pretty);
}

#[test]
fn test_missing_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from_path(dir.path().join("absent.toml"));

    assert_eq!(config, Config::default());
}

#[test]
fn test_broken_file_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "ttl_minutes = \"soon\"\n").unwrap();

    assert_eq!(Config::load_from_path(path), Config::default());
}

#[test]
fn test_hierarchy_defaults_file_env_cli() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "ttl_minutes = 8\nskip_hidden = true\n").unwrap();

    // File overrides defaults
    let config = Config::load_from_path(path.clone());
    assert_eq!(config.ttl_minutes, 8);
    assert!(config.skip_hidden);

    // Environment overrides file
    std::env::set_var("MODELSCAN_TTL_MINUTES", "20");
    let mut config = Config::load_from_path(path);
    assert_eq!(config.ttl_minutes, 20);
    assert!(config.skip_hidden);

    // CLI overrides environment
    let cli = Cli::try_parse_from(["modelscan", "serve", "--ttl-minutes", "3"]).unwrap();
    config.merge_cli(&cli);
    assert_eq!(config.ttl_minutes, 3);

    clear_env();
}

#[test]
fn test_zero_ttl_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "ttl_minutes = 0\n").unwrap();

    let config = Config::load_from_path(path);
    assert_eq!(config.ttl_minutes, 0);
    assert!(matches!(config.validate(), Err(ConfigError::InvalidTtl)));
}

#[test]
fn test_fingerprint_ignores_walk_settings() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let cli = Cli::try_parse_from(["modelscan", "fingerprint", "/models"]).unwrap();
    let mut config = Config::default();
    config.merge_cli(&cli);
    assert_eq!(config, Config::default());
}

#[test]
fn test_saved_config_loads_back() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/modelscan/config.toml");
    let config = Config {
        ttl_minutes: 42,
        follow_symlinks: true,
        skip_hidden: false,
        pretty: true,
    };

    config.save(&path).unwrap();

    assert!(fs::read_to_string(&path).unwrap().contains("ttl_minutes = 42"));
    assert_eq!(Config::load_from_path(path), config);
}

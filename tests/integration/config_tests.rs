use blockdupe::cli::Cli;
use blockdupe::config::{Config, ConfigError, Overrides};
use blockdupe::scanner::Checksum;
use clap::Parser;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;

// Environment variables are process-wide
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_config_load_defaults() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.block_size, 10);
    assert_eq!(config.checksum(), Checksum::Md5);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
include = ["/data/a", "/data/b;/data/c"]
exclude = "/data/a/cache"
depth = 3
min_size = 0
filter = "*.jpg"
block_size = 4096
checksum = "crc32"
io_threads = 8
follow_symlinks = true
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    assert_eq!(
        config.include,
        vec![
            PathBuf::from("/data/a"),
            PathBuf::from("/data/b"),
            PathBuf::from("/data/c")
        ]
    );
    assert_eq!(config.exclude, vec![PathBuf::from("/data/a/cache")]);
    assert_eq!(config.depth, 3);
    assert_eq!(config.min_size, 0);
    assert_eq!(config.filter.as_deref(), Some("*.jpg"));
    assert_eq!(config.block_size, 4096);
    assert_eq!(config.checksum(), Checksum::Crc32);
    assert_eq!(config.io_threads, 8);
    assert!(config.follow_symlinks);
}

#[test]
fn test_config_load_from_env() {
    let _guard = ENV_MUTEX.lock().unwrap();
    std::env::set_var("BLOCKDUPE_INCLUDE", "/env/one;/env/two");
    std::env::set_var("BLOCKDUPE_DEPTH", "5");
    std::env::set_var("BLOCKDUPE_CHECKSUM", "crc32");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("BLOCKDUPE_"))
        .extract()
        .unwrap();

    std::env::remove_var("BLOCKDUPE_INCLUDE");
    std::env::remove_var("BLOCKDUPE_DEPTH");
    std::env::remove_var("BLOCKDUPE_CHECKSUM");

    assert_eq!(
        config.include,
        vec![PathBuf::from("/env/one"), PathBuf::from("/env/two")]
    );
    assert_eq!(config.depth, 5);
    assert_eq!(config.checksum(), Checksum::Crc32);
}

#[test]
fn test_cli_overrides_file() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("blockdupe.toml");
    fs::write(
        &config_path,
        "include = \"/from/file\"\nblock_size = 64\ndepth = 2\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "blockdupe",
        "--block-size",
        "128",
        "--config",
        config_path.to_str().unwrap(),
    ])
    .unwrap();
    let config = Config::load(cli.config.as_deref(), &cli.overrides()).unwrap();

    assert_eq!(config.include, vec![PathBuf::from("/from/file")]);
    assert_eq!(config.block_size, 128);
    assert_eq!(config.depth, 2);
}

#[test]
fn test_load_rejects_invalid_values() {
    let _guard = ENV_MUTEX.lock().unwrap();
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("bad.toml");

    fs::write(&config_path, "include = \"/x\"\nblock_size = 0\n").unwrap();
    assert!(matches!(
        Config::load(Some(&config_path), &Overrides::default()),
        Err(ConfigError::InvalidBlockSize)
    ));

    fs::write(&config_path, "include = \"/x\"\nfilter = \"[abc\"\n").unwrap();
    assert!(matches!(
        Config::load(Some(&config_path), &Overrides::default()),
        Err(ConfigError::InvalidFilter { .. })
    ));

    fs::write(&config_path, "depth = 1\n").unwrap();
    assert!(matches!(
        Config::load(Some(&config_path), &Overrides::default()),
        Err(ConfigError::NoIncludeDirs)
    ));
}

#[test]
fn test_config_invalid_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "depth = = 3").unwrap();

    let result: Result<Config, _> = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract();
    assert!(result.is_err());
}

#[test]
fn test_config_round_trips_through_toml() {
    let config = Config {
        include: vec![PathBuf::from("/a")],
        filter: Some("*.log".to_string()),
        ..Config::default()
    };

    let content = toml::to_string_pretty(&config).unwrap();
    assert!(content.contains("filter = \"*.log\""));
    assert!(content.contains("block_size = 10"));

    let parsed: Config = toml::from_str(&content).unwrap();
    assert_eq!(parsed, config);
}

mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::TempDir;
use csvpage::ErrorKind;
use csvpage::ServerOptions;
use csvpage::config::{DEFAULT_PORT, DEFAULT_READ_TIMEOUT, ServerConfig, Settings, parse_port};
use csvpage::content::resolver::{ResolutionMode, TraversalPolicy};
use csvpage::error::ServerError;
use csvpage::server::WorkerLimit;

#[test]
fn test_parse_port_accepts_valid_range() {
    assert_eq!(parse_port("1").unwrap(), 1);
    assert_eq!(parse_port("8080").unwrap(), 8080);
    assert_eq!(parse_port("65535").unwrap(), 65535);
}

#[test]
fn test_parse_port_rejects_out_of_range_and_text() {
    for bad in ["0", "65536", "-80", "eighty", "80.5", "", "99999999999"] {
        let err = parse_port(bad).unwrap_err();
        assert!(matches!(err, ServerError::InvalidPort(_)), "{bad}");
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
    }
}

#[test]
fn test_server_config_requires_existing_directory() {
    let dir = TempDir::new("config");
    let cfg = ServerConfig::new("9000", dir.path()).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.base_directory, dir.path());

    let missing = dir.path().join("nope");
    let err = ServerConfig::new("9000", &missing).unwrap_err();
    assert!(matches!(err, ServerError::InvalidDirectory(ref p) if *p == missing));
    assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
}

#[test]
fn test_server_config_rejects_file_as_directory() {
    let dir = TempDir::new("config-file");
    let file = dir.write("index.html", "<p>hi</p>");

    assert!(matches!(
        ServerConfig::new("9000", file),
        Err(ServerError::InvalidDirectory(_))
    ));
}

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();

    assert_eq!(settings.server.port, DEFAULT_PORT);
    assert_eq!(settings.server.base_directory, PathBuf::from("."));
    assert_eq!(settings.content.resolution, ResolutionMode::Extension);
    assert_eq!(settings.content.traversal, TraversalPolicy::Reject);
    assert_eq!(settings.content.seed, None);
    assert_eq!(settings.workers.worker_limit(), WorkerLimit::Unbounded);
    assert_eq!(settings.server.read_timeout_ms, 10_000);
    assert_eq!(settings.server.read_timeout(), DEFAULT_READ_TIMEOUT);
}

#[test]
fn test_settings_from_yaml() {
    let yaml = r#"
server:
  port: 9090
  base_directory: /srv/pages
  read_timeout_ms: 2500
content:
  resolution: segment
  traversal: allow
  seed: 42
workers:
  limit: 16
"#;
    let settings = Settings::from_yaml(yaml).unwrap();

    assert_eq!(settings.server.port, 9090);
    assert_eq!(settings.server.base_directory, PathBuf::from("/srv/pages"));
    assert_eq!(settings.server.read_timeout(), Duration::from_millis(2500));
    assert_eq!(settings.content.resolution, ResolutionMode::Segment);
    assert_eq!(settings.content.traversal, TraversalPolicy::Allow);
    assert_eq!(settings.content.seed, Some(42));
    assert_eq!(settings.workers.worker_limit(), WorkerLimit::Bounded(16));
}

#[test]
fn test_settings_partial_yaml_keeps_defaults() {
    let settings = Settings::from_yaml("server:\n  port: 3000\n").unwrap();

    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.server.base_directory, PathBuf::from("."));
    assert_eq!(settings.content.resolution, ResolutionMode::Extension);
}

#[test]
fn test_options_carry_settings() {
    let settings = Settings::from_yaml(
        "server:\n  read_timeout_ms: 750\ncontent:\n  resolution: segment\n  seed: 7\nworkers:\n  limit: 3\n",
    )
    .unwrap();

    let options = ServerOptions::from_settings(&settings);

    assert_eq!(options.read_timeout, Duration::from_millis(750));
    assert_eq!(options.resolution, ResolutionMode::Segment);
    assert_eq!(options.workers, WorkerLimit::Bounded(3));
}

#[test]
fn test_options_debug_omits_random_source() {
    let rendered = format!("{:?}", ServerOptions::default());

    assert!(rendered.starts_with("ServerOptions {"), "{rendered}");
    assert!(rendered.contains("read_timeout: 10s"), "{rendered}");
    assert!(rendered.contains("workers: Unbounded"), "{rendered}");
    assert!(!rendered.contains("random"), "{rendered}");
    assert!(rendered.ends_with(".. }"), "{rendered}");
}

#[test]
fn test_settings_rejects_unknown_mode() {
    assert!(Settings::from_yaml("content:\n  resolution: random\n").is_err());
}

#[test]
fn test_settings_load_file_with_env_overrides() {
    let dir = TempDir::new("settings");
    let file = dir.write("csvpage.yaml", "server:\n  port: 3000\ncontent:\n  resolution: extension\n");

    unsafe {
        std::env::set_var("CSVPAGE_PORT", "4000");
        std::env::set_var("CSVPAGE_MODE", "segment");
    }
    let settings = Settings::load(Some(&file));
    unsafe {
        std::env::remove_var("CSVPAGE_PORT");
        std::env::remove_var("CSVPAGE_MODE");
    }

    let settings = settings.unwrap();
    assert_eq!(settings.server.port, 4000);
    assert_eq!(settings.content.resolution, ResolutionMode::Segment);
}

#[test]
fn test_settings_missing_file_is_an_error() {
    let dir = TempDir::new("settings-missing");
    assert!(Settings::from_file(&dir.path().join("absent.yaml")).is_err());
}

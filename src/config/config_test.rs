use config::Config;
use config::File;
use config::FileFormat;

use crate::DiffStrategy;
use crate::MirrorConfig;
use crate::WriteConcern;

#[test]
fn test_defaults() {
    let config = MirrorConfig::default();

    assert_eq!(config.map_name, "__vertx.haInfo");
    assert_eq!(config.write_concern, WriteConcern::LocalOnly);
    assert_eq!(config.diff_strategy, DiffStrategy::SymmetricDiff);
    assert_eq!(config.watch_backoff.max_retries, 5);
    assert_eq!(config.watch_backoff.base_delay_ms, 100);
}

#[test]
fn test_deserialize_from_toml() {
    let toml = r#"
        map_name = "ha-info"
        write_concern = "local_then_confirm"
        diff_strategy = "size_heuristic"

        [watch_backoff]
        max_retries = 2
        base_delay_ms = 10
    "#;

    let config: MirrorConfig = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .expect("config should build")
        .try_deserialize()
        .expect("config should deserialize");

    assert_eq!(config.map_name, "ha-info");
    assert_eq!(config.write_concern, WriteConcern::LocalThenConfirm);
    assert_eq!(config.diff_strategy, DiffStrategy::SizeHeuristic);
    assert_eq!(config.watch_backoff.max_retries, 2);
    assert_eq!(config.watch_backoff.base_delay_ms, 10);
    // Unset fields fall back to serde defaults
    assert_eq!(config.watch_backoff.timeout_ms, 1000);
    assert_eq!(config.watch_backoff.max_delay_ms, 5000);
}

#[test]
fn test_partial_config_uses_defaults() {
    let config: MirrorConfig = Config::builder()
        .add_source(File::from_str("map_name = \"custom\"", FileFormat::Toml))
        .build()
        .expect("config should build")
        .try_deserialize()
        .expect("config should deserialize");

    assert_eq!(config.map_name, "custom");
    assert_eq!(config.write_concern, WriteConcern::LocalOnly);
    assert_eq!(config.diff_strategy, DiffStrategy::SymmetricDiff);
}

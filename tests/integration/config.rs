use std::fs;

use gateway_events::config::{self, Config, ConfigError, LogFormat};
use gateway_events::{ListenerOperation, SizeEstimator};

use crate::fixtures::events::initialized;
use crate::fixtures::record::FakeRecord;

#[test]
fn layered_files_feed_the_estimator() {
    let dir = tempfile::tempdir().expect("tempdir");
    let base = dir.path().join("gateway.toml");
    let site = dir.path().join("site.toml");
    fs::write(
        &base,
        "[sizing]\nper_object_overhead = 24\nreference_size = 8\n\n[logging]\nformat = \"pretty\"\n",
    )
    .expect("write base");
    fs::write(&site, "[sizing]\nreference_size = 4\n").expect("write site");

    let loaded = config::load(&[base.as_path(), site.as_path()]).expect("load");
    assert_eq!(loaded.sizing.reference_size, 4);
    assert_eq!(loaded.logging.format, LogFormat::Pretty);

    let event = initialized(ListenerOperation::AfterCreate, FakeRecord::new(1, 1));
    let calibrated = SizeEstimator::new(loaded.sizing).estimate(&event);
    let stock = SizeEstimator::new(Config::default().sizing).estimate(&event);
    assert!(calibrated > stock);
}

#[test]
fn broken_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "sizing = [").expect("write");

    assert!(matches!(
        config::load(&[path.as_path()]),
        Err(ConfigError::Parse { .. })
    ));
    let fallback = config::load_or_default(&[path.as_path()]);
    assert_eq!(fallback.sizing, Config::default().sizing);
}

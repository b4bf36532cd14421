use quorumlab::{Overrides, SimConfig, StorageConfig};
use quorumlab_common::{EventSink, SimError};
use tempfile::NamedTempFile;

#[test]
fn save_and_load_round_trip() {
    let config = SimConfig {
        nodes: 7,
        election_seed: Some(3),
        storage: StorageConfig::File { data_dir: "data".into() },
        ..Default::default()
    };
    let file = NamedTempFile::new().unwrap();
    config.save_to_file(file.path()).unwrap();

    let loaded = SimConfig::load_from_file(file.path()).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn malformed_file_is_a_serialization_error() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "{ nodes: ").unwrap();
    assert!(matches!(SimConfig::load_from_file(file.path()), Err(SimError::Serialization(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(SimConfig::load_from_file("/nonexistent/quorumlab.json"), Err(SimError::Io(_))));
}

#[test]
fn build_cluster_validates_first() {
    let mut config = SimConfig::default();
    config.apply(&Overrides { nodes: Some(2), ..Default::default() });
    config.quorum_size = Some(3);
    assert!(matches!(config.build_cluster(EventSink::disabled()), Err(SimError::Config(_))));

    config.quorum_size = None;
    let cluster = config.build_cluster(EventSink::disabled()).unwrap();
    assert_eq!(cluster.len(), 2);
}

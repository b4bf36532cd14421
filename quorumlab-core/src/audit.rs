use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use quorumlab_common::{utils::time::timestamp, Key, ProtocolEvent};
use quorumlab_consensus::{LogEntry, NodeView};
use serde::{Deserialize, Serialize};

use crate::scenario::ScenarioReport;
use crate::simulator::Simulator;

/// Everything a session produced.
///
/// It includes:
/// - The ordered event stream rendered during the run.
/// - Every node's final status and state.
/// - The Raft leader's log.
/// - The scenario report, when a scenario was run.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct AuditData {
    pub generated_at: String,
    pub events: Vec<ProtocolEvent>,
    pub nodes: Vec<NodeView>,
    pub raft_term: u64,
    pub raft_log: BTreeMap<Key, LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioReport>,
}

impl AuditData {
    pub fn capture(simulator: &Simulator, events: Vec<ProtocolEvent>) -> Self {
        Self {
            generated_at: timestamp(),
            events,
            nodes: simulator.cluster().view(),
            raft_term: simulator.raft().term(),
            raft_log: simulator.raft().log().clone(),
            scenario: None,
        }
    }
}

/// Saves audit data to a JSON file in pretty format.
pub fn save_audit<P: AsRef<Path>>(path: P, data: &AuditData) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

/// Loads audit data from a JSON file.
pub fn load_audit<P: AsRef<Path>>(path: P) -> std::io::Result<AuditData> {
    let json = fs::read_to_string(path)?;
    let data: AuditData = serde_json::from_str(&json)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use quorumlab_common::{EventSink, NodeStatus, Severity};
    use quorumlab_consensus::{Operation, ProtocolKind};
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_save_and_load_audit_data() {
        let config = SimConfig { election_seed: Some(1), ..Default::default() };
        let mut sim = Simulator::from_config(&config, EventSink::disabled()).unwrap();
        sim.cluster_mut().set_active(2.into(), false).unwrap();
        sim.run(ProtocolKind::Raft, Operation::Replicate { key: 10, value: "Raft Log Entry".into() })
            .await
            .unwrap();

        let events = vec![ProtocolEvent {
            severity: Severity::Success,
            message: "🎉 Log Entry 10 Committed!".into(),
        }];
        let data = AuditData::capture(&sim, events);

        let file = NamedTempFile::new().expect("Failed to create temp file");
        save_audit(file.path(), &data).expect("Failed to save audit");
        let loaded = load_audit(file.path()).expect("Failed to load audit");

        assert_eq!(loaded, data);
        assert_eq!(loaded.nodes[1].status, NodeStatus::Crashed);
        assert!(loaded.nodes[1].state.is_none());
        assert_eq!(loaded.raft_log[&10].command, "SET 10 = 'Raft Log Entry'");
    }
}

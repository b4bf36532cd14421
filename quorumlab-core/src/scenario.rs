//! Scripted runs: an ordered list of fault toggles and protocol operations
//! applied to one cluster.
//!
//! ```json
//! {
//!   "name": "byzantine-write",
//!   "steps": [
//!     { "step": "byzantine", "node": 2 },
//!     { "step": "run", "protocol": "bft", "operation": { "op": "write", "key": 4, "value": "v" } },
//!     { "step": "run", "protocol": "bft", "operation": { "op": "read", "key": 4 } }
//!   ]
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use quorumlab_common::{utils::time::timestamp, Result};
use quorumlab_consensus::{Operation, OperationOutcome, ProtocolKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Crash { node: u32 },
    Recover { node: u32 },
    Byzantine { node: u32 },
    Honest { node: u32 },
    Run { protocol: ProtocolKind, operation: Operation },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Crash { node } => write!(f, "crash node {}", node),
            Step::Recover { node } => write!(f, "recover node {}", node),
            Step::Byzantine { node } => write!(f, "make node {} byzantine", node),
            Step::Honest { node } => write!(f, "make node {} honest", node),
            Step::Run { protocol, operation } => write!(f, "{} {}", protocol, operation.name()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub index: usize,
    pub step: Step,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<OperationOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepReport {
    pub fn new(index: usize, step: Step, result: Result<Option<OperationOutcome>>) -> Self {
        let (outcome, error) = match result {
            Ok(outcome) => (outcome, None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self { index, step, outcome, error }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub run_id: String,
    pub name: String,
    pub started_at: String,
    pub steps: Vec<StepReport>,
}

impl ScenarioReport {
    pub fn start(name: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            started_at: timestamp(),
            steps: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.steps.iter().filter(|s| s.is_ok()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        let json = r#"{
            "steps": [
                {"step": "crash", "node": 2},
                {"step": "run", "protocol": "two_phase", "operation": {"op": "transaction", "key": 20, "value": "v"}}
            ]
        }"#;
        let scenario: Scenario = serde_json::from_str(json).unwrap();
        assert_eq!(scenario.name, "");
        assert_eq!(scenario.steps[0], Step::Crash { node: 2 });
        assert_eq!(scenario.steps[1].to_string(), "two-phase transaction");
    }

    #[test]
    fn test_step_report_from_error() {
        let report = StepReport::new(
            3,
            Step::Recover { node: 9 },
            Err(quorumlab_common::SimError::UnknownNode(9.into())),
        );
        assert!(!report.is_ok());
        assert_eq!(report.error.as_deref(), Some("Unknown node: 9"));
    }
}

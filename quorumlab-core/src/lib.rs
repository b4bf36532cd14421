// lib.rs
pub mod audit;
pub mod cli;
pub mod config;
pub mod scenario;
pub mod simulator;

pub use audit::{load_audit, save_audit, AuditData};
pub use config::{Overrides, SimConfig, StorageConfig};
pub use scenario::{Scenario, ScenarioReport, Step, StepReport};
pub use simulator::Simulator;

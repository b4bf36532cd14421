use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use quorumlab_common::Key;

use crate::config::Overrides;

/// Stdout filter when `RUST_LOG` is unset. The `consensus` mirror is left to
/// the event renderer and the optional log file.
pub const DEFAULT_LOG_FILTER: &str = "info,quorumlab=debug,consensus=off";

#[derive(Parser, Debug)]
#[command(name = "quorumlab")]
#[command(about = "Replication protocol simulator: BFT quorums, Raft and Two-Phase Commit")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// JSON config file; missing fields fall back to defaults
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of nodes in the cluster
    #[arg(long, global = true)]
    pub nodes: Option<u32>,

    /// Seed for elections and 2PC votes
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Persist node state as JSON files in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Nodes to mark crashed before running (repeat or comma-separate)
    #[arg(long, global = true, value_name = "ID", action = ArgAction::Append, value_delimiter = ',')]
    pub crash: Vec<u32>,

    /// Nodes to mark Byzantine before running (repeat or comma-separate)
    #[arg(long, global = true, value_name = "ID", action = ArgAction::Append, value_delimiter = ',')]
    pub byzantine: Vec<u32>,

    /// Write an audit of events and final node state here
    #[arg(long, global = true, value_name = "FILE")]
    pub audit_out: Option<PathBuf>,

    /// Append `consensus` events to this log file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            nodes: self.nodes,
            seed: self.seed,
            data_dir: self.data_dir.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Byzantine quorum broadcast
    Bft {
        #[command(subcommand)]
        action: BftAction,
    },
    /// Raft leader election and log replication
    Raft {
        #[command(subcommand)]
        action: RaftAction,
    },
    /// Run one Two-Phase Commit transaction
    TwoPhase {
        #[arg(long, default_value_t = 20)]
        key: Key,
        #[arg(long, default_value = "2PC Atomic Transaction")]
        value: String,
    },
    /// Bloom filter membership demo
    Bloom {
        /// Items to insert
        #[arg(long, num_args = 1..)]
        add: Vec<String>,
        /// Items to look up
        #[arg(long, num_args = 1..)]
        check: Vec<String>,
        #[arg(long, default_value_t = quorumlab_bloom::DEFAULT_SIZE)]
        size: usize,
        #[arg(long, default_value_t = quorumlab_bloom::DEFAULT_HASHES)]
        hashes: usize,
    },
    /// Run a JSON scenario of fault toggles and operations
    Scenario {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Print every node's status and state
    Status,
    /// Write a config file with default values
    InitConfig {
        #[arg(value_name = "FILE", default_value = "quorumlab.json")]
        path: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum BftAction {
    Write {
        #[arg(long, default_value_t = 4)]
        key: Key,
        #[arg(long, default_value = "HBBFT NEW VALUE")]
        value: String,
    },
    Read {
        #[arg(long, default_value_t = 1)]
        key: Key,
    },
}

#[derive(Subcommand, Debug)]
pub enum RaftAction {
    /// Start a new term and elect a random active node
    Elect,
    /// Append an entry on the leader and commit it on a majority
    Replicate {
        #[arg(long, default_value_t = 10)]
        key: Key,
        #[arg(long, default_value = "Raft Log Entry")]
        value: String,
        /// Hold an election first
        #[arg(long)]
        elect: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "quorumlab",
            "bft",
            "write",
            "--key",
            "7",
            "--value",
            "x",
            "--crash",
            "2",
            "--byzantine",
            "3",
            "--seed",
            "9",
        ])
        .unwrap();
        assert_eq!(cli.global.crash, vec![2]);
        assert_eq!(cli.global.byzantine, vec![3]);
        assert_eq!(cli.global.seed, Some(9));
        match cli.command {
            Commands::Bft { action: BftAction::Write { key, value } } => {
                assert_eq!(key, 7);
                assert_eq!(value, "x");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fault_flags_before_subcommand() {
        let cli = Cli::try_parse_from(["quorumlab", "--crash", "2", "status"]).unwrap();
        assert_eq!(cli.global.crash, vec![2]);
        assert!(matches!(cli.command, Commands::Status));

        let cli = Cli::try_parse_from(["quorumlab", "scenario", "--crash", "2", "s.json"]).unwrap();
        assert_eq!(cli.global.crash, vec![2]);
        assert!(matches!(cli.command, Commands::Scenario { ref path } if path == &PathBuf::from("s.json")));
    }

    #[test]
    fn test_fault_flags_repeat_and_split() {
        let cli = Cli::try_parse_from(["quorumlab", "--crash", "1,3", "--crash", "4", "--byzantine", "2", "status"])
            .unwrap();
        assert_eq!(cli.global.crash, vec![1, 3, 4]);
        assert_eq!(cli.global.byzantine, vec![2]);
    }

    #[test]
    fn test_default_log_filter_parses() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        assert!(DEFAULT_LOG_FILTER.starts_with("info,quorumlab=debug"));
        assert!(DEFAULT_LOG_FILTER.ends_with("consensus=off"));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["quorumlab", "two-phase"]).unwrap();
        assert!(matches!(cli.command, Commands::TwoPhase { key: 20, .. }));
        assert!(cli.global.crash.is_empty());
        assert_eq!(cli.global.overrides().nodes, None);
    }

    #[test]
    fn test_bloom_lists() {
        let cli = Cli::try_parse_from(["quorumlab", "bloom", "--add", "a", "b", "--check", "c"]).unwrap();
        match cli.command {
            Commands::Bloom { add, check, size, hashes } => {
                assert_eq!(add, vec!["a", "b"]);
                assert_eq!(check, vec!["c"]);
                assert_eq!((size, hashes), (30, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

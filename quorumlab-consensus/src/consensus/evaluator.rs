use serde::{Deserialize, Serialize};

/// Number of acknowledgements or responses that makes a decision binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    pub quorum_size: usize,
}

impl Default for QuorumPolicy {
    /// 3 of 4: the BFT quorum of the reference cluster.
    fn default() -> Self {
        Self { quorum_size: 3 }
    }
}

impl QuorumPolicy {
    pub fn new(quorum_size: usize) -> Self {
        Self { quorum_size }
    }

    /// BFT quorum for `n` nodes: f = (n-1)/3, quorum = 2f + 1.
    pub fn bft(n: usize) -> Self {
        Self { quorum_size: 2 * fault_tolerance(n) + 1 }
    }

    pub fn is_met(&self, count: usize) -> bool {
        count >= self.quorum_size
    }
}

/// Byzantine faults an `n`-node cluster tolerates.
pub fn fault_tolerance(n: usize) -> usize {
    n.saturating_sub(1) / 3
}

/// Simple majority used by leader-based replication: floor(n/2) + 1.
pub fn majority(n: usize) -> usize {
    n / 2 + 1
}

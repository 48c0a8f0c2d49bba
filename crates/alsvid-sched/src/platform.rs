//! Platform description the schedulers consult.

use serde::{Deserialize, Serialize};

/// The two platform facts scheduling depends on.
///
/// Gate durations and the cycle time share one unit (typically nanoseconds);
/// everything the schedulers emit is expressed in whole cycles of that
/// cycle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    /// Duration of one scheduling cycle, in gate-duration units. Always >= 1.
    pub cycle_time: u64,
    /// Number of qubits the platform provides.
    pub qubit_number: usize,
}

impl Platform {
    /// Create a platform description. A zero cycle time is clamped to 1.
    pub fn new(cycle_time: u64, qubit_number: usize) -> Self {
        Self {
            cycle_time: cycle_time.max(1),
            qubit_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_cycle_time_clamped() {
        let p = Platform::new(0, 5);
        assert_eq!(p.cycle_time, 1);
        assert_eq!(p.qubit_number, 5);
    }
}

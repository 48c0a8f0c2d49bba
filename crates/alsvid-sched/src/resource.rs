//! Scheduling direction and the resource-manager seam.

use serde::{Deserialize, Serialize};

use alsvid_ir::Gate;

use crate::platform::Platform;

/// The direction a scheduling pass walks the dependence graph in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// From source to sink; produces ASAP-style schedules.
    Forward,
    /// From sink to source; produces ALAP-style schedules.
    Backward,
}

impl Direction {
    /// Check if this is the forward direction.
    #[inline]
    pub fn is_forward(self) -> bool {
        matches!(self, Direction::Forward)
    }
}

/// Answers placement questions for the resource-constrained schedulers.
///
/// `available` must be a pure query: calling it repeatedly for the same cycle
/// and gate returns the same answer until `reserve` commits something.
/// `reserve` is monotonic in the scheduling direction; reservations are never
/// withdrawn. One manager instance serves exactly one scheduling run.
pub trait ResourceManager {
    /// Can `gate` start at `cycle` given the reservations so far?
    fn available(&self, cycle: u64, gate: &Gate, platform: &Platform) -> bool;

    /// Commit `gate` starting at `cycle`.
    fn reserve(&mut self, cycle: u64, gate: &Gate, platform: &Platform);
}

/// Exclusive qubit occupancy: no two gates may overlap on a qubit.
///
/// Each gate occupies its qubits for `[cycle, cycle + duration_in_cycles)`.
/// Forward runs track the first free cycle per qubit; backward runs track the
/// earliest start already reserved per qubit, since the scheduler hands out
/// non-increasing cycles in that direction.
#[derive(Debug, Clone)]
pub struct QubitResources {
    direction: Direction,
    horizon: Vec<u64>,
}

impl QubitResources {
    /// Create a manager for one scheduling run in the given direction.
    pub fn new(platform: &Platform, direction: Direction) -> Self {
        let fill = match direction {
            Direction::Forward => 0,
            Direction::Backward => u64::MAX,
        };
        Self {
            direction,
            horizon: vec![fill; platform.qubit_number],
        }
    }

    fn fill_value(&self) -> u64 {
        match self.direction {
            Direction::Forward => 0,
            Direction::Backward => u64::MAX,
        }
    }
}

impl ResourceManager for QubitResources {
    fn available(&self, cycle: u64, gate: &Gate, platform: &Platform) -> bool {
        let busy = gate.duration_in_cycles(platform.cycle_time);
        gate.qubits.iter().all(|q| {
            let h = self
                .horizon
                .get(q.index())
                .copied()
                .unwrap_or_else(|| self.fill_value());
            match self.direction {
                Direction::Forward => cycle >= h,
                Direction::Backward => cycle.saturating_add(busy) <= h,
            }
        })
    }

    fn reserve(&mut self, cycle: u64, gate: &Gate, platform: &Platform) {
        let busy = gate.duration_in_cycles(platform.cycle_time);
        let fill = self.fill_value();
        for q in &gate.qubits {
            if q.index() >= self.horizon.len() {
                self.horizon.resize(q.index() + 1, fill);
            }
            self.horizon[q.index()] = match self.direction {
                Direction::Forward => cycle + busy,
                Direction::Backward => cycle,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::QubitId;

    fn platform() -> Platform {
        Platform::new(20, 3)
    }

    #[test]
    fn test_forward_excludes_overlap() {
        let platform = platform();
        let mut rm = QubitResources::new(&platform, Direction::Forward);
        let a = Gate::generic("x", [QubitId(0)], 40); // 2 cycles

        assert!(rm.available(1, &a, &platform));
        rm.reserve(1, &a, &platform);

        let b = Gate::generic("y", [QubitId(0)], 20);
        assert!(!rm.available(1, &b, &platform));
        assert!(!rm.available(2, &b, &platform));
        assert!(rm.available(3, &b, &platform));
    }

    #[test]
    fn test_forward_disjoint_qubits_independent() {
        let platform = platform();
        let mut rm = QubitResources::new(&platform, Direction::Forward);
        let a = Gate::generic("x", [QubitId(0)], 40);
        rm.reserve(1, &a, &platform);

        let b = Gate::generic("y", [QubitId(1)], 20);
        assert!(rm.available(1, &b, &platform));
    }

    #[test]
    fn test_backward_excludes_overlap() {
        let platform = platform();
        let mut rm = QubitResources::new(&platform, Direction::Backward);
        let a = Gate::generic("x", [QubitId(0)], 20); // 1 cycle

        assert!(rm.available(9, &a, &platform));
        rm.reserve(9, &a, &platform);

        // an earlier gate on the same qubit must complete by cycle 9
        let b = Gate::generic("y", [QubitId(0)], 40); // 2 cycles
        assert!(!rm.available(8, &b, &platform));
        assert!(rm.available(7, &b, &platform));
    }

    #[test]
    fn test_two_qubit_gate_needs_both() {
        let platform = platform();
        let mut rm = QubitResources::new(&platform, Direction::Forward);
        let a = Gate::generic("x", [QubitId(1)], 20);
        rm.reserve(2, &a, &platform);

        let cx = Gate::cnot(QubitId(0), QubitId(1), 20);
        assert!(!rm.available(2, &cx, &platform));
        assert!(rm.available(3, &cx, &platform));
    }
}

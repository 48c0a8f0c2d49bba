//! Kernels (straight-line circuits) and programs.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;

/// A straight-line quantum circuit plus the operand counts it is valid for.
///
/// Kernels are what the schedulers operate on: the gate sequence is in
/// program order on construction, and in non-decreasing cycle order (stable
/// among ties) after a successful scheduling run, with `cycles_valid` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kernel {
    /// Kernel name, used for diagnostics and output file names.
    pub name: String,
    /// Number of qubits this kernel addresses.
    pub qubit_count: usize,
    /// Number of classical registers this kernel addresses.
    pub creg_count: usize,
    /// Whether the gates' cycle fields reflect a completed scheduling run.
    pub cycles_valid: bool,
    gates: Vec<Gate>,
}

impl Kernel {
    /// Create an empty kernel for the given operand counts.
    pub fn new(name: impl Into<String>, qubit_count: usize, creg_count: usize) -> Self {
        Self {
            name: name.into(),
            qubit_count,
            creg_count,
            cycles_valid: false,
            gates: vec![],
        }
    }

    /// Append a gate. Operand ranges are not checked; see [`Kernel::try_push`].
    pub fn push(&mut self, gate: Gate) {
        self.cycles_valid = false;
        self.gates.push(gate);
    }

    /// Append a gate after validating its name and operand ranges.
    ///
    /// Qubit operands must lie in `[0, qubit_count)` and register operands in
    /// `[0, creg_count)`; violations report the combined operand index.
    pub fn try_push(&mut self, gate: Gate) -> IrResult<()> {
        if gate.name.is_empty() {
            return Err(IrError::EmptyName);
        }
        let limit = self.combined_operand_count();
        for q in &gate.qubits {
            if q.index() >= self.qubit_count {
                return Err(IrError::OperandOutOfRange {
                    gate: gate.qasm(),
                    operand: q.index(),
                    limit,
                });
            }
        }
        for c in &gate.cregs {
            let combined = c.combined_index(self.qubit_count);
            if combined >= limit {
                return Err(IrError::OperandOutOfRange {
                    gate: gate.qasm(),
                    operand: combined,
                    limit,
                });
            }
        }
        self.push(gate);
        Ok(())
    }

    /// The gates, in current order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Mutable access to the gates.
    pub fn gates_mut(&mut self) -> &mut [Gate] {
        &mut self.gates
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check if the kernel has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Size of the combined operand space (`qubit_count + creg_count`).
    pub fn combined_operand_count(&self) -> usize {
        self.qubit_count + self.creg_count
    }

    /// Stable-sort gates by ascending cycle.
    ///
    /// Stability preserves program order among gates sharing a cycle, which
    /// downstream passes rely on.
    pub fn sort_by_cycle(&mut self) {
        self.gates.sort_by_key(|g| g.cycle);
    }

    /// Schedule depth: the cycle at which the last gate completes.
    ///
    /// Returns 0 when no gate has been scheduled yet.
    pub fn depth(&self, cycle_time: u64) -> u64 {
        self.gates
            .iter()
            .filter(|g| g.is_scheduled())
            .map(|g| g.cycle + g.duration_in_cycles(cycle_time))
            .max()
            .unwrap_or(0)
    }
}

/// An ordered collection of kernels scheduled one at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Program name.
    pub name: String,
    /// The kernels, in execution order.
    pub kernels: Vec<Kernel>,
}

impl Program {
    /// Create an empty program.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kernels: vec![],
        }
    }

    /// Append a kernel.
    pub fn push(&mut self, kernel: Kernel) {
        self.kernels.push(kernel);
    }
}

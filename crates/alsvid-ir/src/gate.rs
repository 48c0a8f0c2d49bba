//! Gate descriptors consumed and annotated by the schedulers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::qubit::{CregId, QubitId};

/// The kind of a gate, as far as dependence tracking is concerned.
///
/// Dependence-graph construction dispatches on this tag: it determines which
/// access events (write, read, controlled-target) a gate performs on each of
/// its operands. Gates whose semantics the scheduler does not recognize fall
/// back to [`GateKind::Generic`], which is conservative (read+write on every
/// operand) and therefore always safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// Projective measurement of qubits into classical registers.
    Measure,
    /// Display/dump pseudo-gate; barriers every qubit and register.
    Display,
    /// Purely classical register operation.
    Classical,
    /// Controlled-X. The control operand commutes with other controls, the
    /// target operand with other targets.
    Cnot,
    /// Controlled-Z (or controlled-phase); symmetric in its operands.
    Cz,
    /// Explicit wait; serializes its qubits.
    Wait,
    /// Qubit remapping pseudo-gate.
    Remap,
    /// Scheduler-internal placeholder gate.
    Dummy,
    /// Any other gate.
    Generic,
}

impl GateKind {
    /// Short lowercase name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            GateKind::Measure => "measure",
            GateKind::Display => "display",
            GateKind::Classical => "classical",
            GateKind::Cnot => "cnot",
            GateKind::Cz => "cz",
            GateKind::Wait => "wait",
            GateKind::Remap => "remap",
            GateKind::Dummy => "dummy",
            GateKind::Generic => "generic",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single gate in a straight-line kernel.
///
/// Everything except `cycle` is read-only to the schedulers. `cycle` starts
/// at [`Gate::UNSCHEDULED`] and is assigned exactly once per scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// Gate name, e.g. `"h"`, `"cnot"`, `"measure"`.
    pub name: String,
    /// Scheduling-relevant kind tag.
    pub kind: GateKind,
    /// Qubit operands, in signature order.
    pub qubits: Vec<QubitId>,
    /// Classical register operands, in signature order.
    pub cregs: Vec<CregId>,
    /// Duration in platform time units (the same units as the cycle time).
    pub duration: u64,
    /// Cycle assigned by a scheduler; [`Gate::UNSCHEDULED`] until then.
    pub cycle: u64,
}

impl Gate {
    /// Sentinel cycle value for gates no scheduler has placed yet.
    pub const UNSCHEDULED: u64 = u64::MAX;

    /// Create a gate with an explicit kind and operand lists.
    pub fn new(
        name: impl Into<String>,
        kind: GateKind,
        qubits: impl IntoIterator<Item = QubitId>,
        cregs: impl IntoIterator<Item = CregId>,
        duration: u64,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            qubits: qubits.into_iter().collect(),
            cregs: cregs.into_iter().collect(),
            duration,
            cycle: Self::UNSCHEDULED,
        }
    }

    /// Create a measurement of `qubit` into `creg`.
    pub fn measure(qubit: QubitId, creg: CregId, duration: u64) -> Self {
        Self::new("measure", GateKind::Measure, [qubit], [creg], duration)
    }

    /// Create a display pseudo-gate (no explicit operands).
    pub fn display() -> Self {
        Self::new("display", GateKind::Display, [], [], 0)
    }

    /// Create a classical register operation.
    pub fn classical(
        name: impl Into<String>,
        cregs: impl IntoIterator<Item = CregId>,
        duration: u64,
    ) -> Self {
        Self::new(name, GateKind::Classical, [], cregs, duration)
    }

    /// Create a CNOT with the given control and target.
    pub fn cnot(control: QubitId, target: QubitId, duration: u64) -> Self {
        Self::new("cnot", GateKind::Cnot, [control, target], [], duration)
    }

    /// Create a CZ on the given qubit pair.
    pub fn cz(a: QubitId, b: QubitId, duration: u64) -> Self {
        Self::new("cz", GateKind::Cz, [a, b], [], duration)
    }

    /// Create an explicit wait on the given qubits.
    pub fn wait(qubits: impl IntoIterator<Item = QubitId>, duration: u64) -> Self {
        Self::new("wait", GateKind::Wait, qubits, [], duration)
    }

    /// Create a qubit remapping pseudo-gate.
    pub fn remap(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self::new("remap", GateKind::Remap, qubits, [], 0)
    }

    /// Create a scheduler placeholder gate.
    pub fn dummy() -> Self {
        Self::new("dummy", GateKind::Dummy, [], [], 0)
    }

    /// Create a generic gate (conservative read+write on every operand).
    pub fn generic(
        name: impl Into<String>,
        qubits: impl IntoIterator<Item = QubitId>,
        duration: u64,
    ) -> Self {
        Self::new(name, GateKind::Generic, qubits, [], duration)
    }

    /// Check if this gate has been assigned a cycle.
    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.cycle != Self::UNSCHEDULED
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        self.kind == GateKind::Measure
    }

    /// Check if this is a CNOT.
    pub fn is_cnot(&self) -> bool {
        self.kind == GateKind::Cnot
    }

    /// Check if this is a classical register operation.
    pub fn is_classical(&self) -> bool {
        self.kind == GateKind::Classical
    }

    /// Duration rounded up to whole cycles of the given cycle time.
    ///
    /// This is the minimum number of cycles between this gate's start and
    /// the start of anything depending on it, and the width of the resource
    /// window it occupies.
    #[inline]
    pub fn duration_in_cycles(&self, cycle_time: u64) -> u64 {
        self.duration.div_ceil(cycle_time.max(1))
    }

    /// Compact textual rendering, e.g. `"cnot q0, q1"` or `"measure q0 -> c0"`.
    pub fn qasm(&self) -> String {
        let mut out = self.name.clone();
        if !self.qubits.is_empty() {
            out.push(' ');
            let mut first = true;
            for q in &self.qubits {
                if !first {
                    out.push_str(", ");
                }
                out.push_str(&q.to_string());
                first = false;
            }
        }
        if !self.cregs.is_empty() {
            out.push_str(if self.qubits.is_empty() { " " } else { " -> " });
            let mut first = true;
            for c in &self.cregs {
                if !first {
                    out.push_str(", ");
                }
                out.push_str(&c.to_string());
                first = false;
            }
        }
        out
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qasm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_starts_unscheduled() {
        let g = Gate::generic("h", [QubitId(0)], 40);
        assert!(!g.is_scheduled());
        assert_eq!(g.cycle, Gate::UNSCHEDULED);
    }

    #[test]
    fn test_duration_in_cycles_rounds_up() {
        let g = Gate::generic("x", [QubitId(0)], 45);
        assert_eq!(g.duration_in_cycles(20), 3);
        assert_eq!(g.duration_in_cycles(45), 1);
        assert_eq!(g.duration_in_cycles(50), 1);
    }

    #[test]
    fn test_zero_duration_takes_zero_cycles() {
        let g = Gate::classical("add", [CregId(0)], 0);
        assert_eq!(g.duration_in_cycles(20), 0);
    }

    #[test]
    fn test_qasm_rendering() {
        assert_eq!(Gate::cnot(QubitId(0), QubitId(1), 80).qasm(), "cnot q0, q1");
        assert_eq!(
            Gate::measure(QubitId(2), CregId(0), 300).qasm(),
            "measure q2 -> c0"
        );
        assert_eq!(Gate::classical("add", [CregId(1)], 0).qasm(), "add c1");
        assert_eq!(Gate::display().qasm(), "display");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(GateKind::Cnot.as_str(), "cnot");
        assert_eq!(GateKind::Measure.to_string(), "measure");
    }
}

//! Dependence-graph construction.
//!
//! One node per gate plus two sentinels: a source that implicitly writes
//! every operand before the first gate, and a sink that reads and writes
//! every operand after the last one. Edges carry the combined operand that
//! caused them, a dependence kind, and a weight in whole cycles.
//!
//! Qubits cannot be cloned, so a plain reading of quantum operands would
//! chain every use of a qubit into strict program order. Three access
//! classes relax that where commutation allows it:
//!
//! - `W` (write): barriers the operand; measure results, waits, displays and
//!   unrecognized gates use it.
//! - `R` (read): CZ operands and CNOT controls. Reads on the same operand
//!   commute with each other.
//! - `D` (controlled target): CNOT targets. Ds commute with each other but
//!   order against both reads and writes.
//!
//! The resulting transition table (rows = prior access, columns = current):
//!
//! ```text
//!              W   R   D
//!     W        /   /   /
//!     R        /   no  /
//!     D        /   /   no
//! ```
//!
//! which yields exactly the known commutation facts: CNOTs sharing a control
//! commute, CNOTs sharing a target commute, and CZ is symmetric in its
//! operands. When the `commute` flag is off, the two `no` entries become
//! RAR/DAD edges and those gates serialize in program order again.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction::{Incoming, Outgoing};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use alsvid_ir::{Gate, GateKind, Kernel};

use crate::error::{ScheduleError, ScheduleResult};
use crate::platform::Platform;
use crate::resource::Direction;

/// Dependence kind carried by every edge.
///
/// The schedulers only care that an edge exists; the kind records which
/// access pair produced it, which matters for graph inspection and for
/// other consumers such as liveness analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepKind {
    /// Write after write.
    Waw,
    /// Write after read.
    War,
    /// Write after controlled-target access.
    Wad,
    /// Read after write.
    Raw,
    /// Read after read (only with commutation disabled).
    Rar,
    /// Read after controlled-target access.
    Rad,
    /// Controlled-target access after write.
    Daw,
    /// Controlled-target access after read.
    Dar,
    /// Controlled-target access after controlled-target access (only with
    /// commutation disabled).
    Dad,
}

impl DepKind {
    /// Conventional uppercase name, e.g. `"RAW"`.
    pub fn as_str(self) -> &'static str {
        match self {
            DepKind::Waw => "WAW",
            DepKind::War => "WAR",
            DepKind::Wad => "WAD",
            DepKind::Raw => "RAW",
            DepKind::Rar => "RAR",
            DepKind::Rad => "RAD",
            DepKind::Daw => "DAW",
            DepKind::Dar => "DAR",
            DepKind::Dad => "DAD",
        }
    }
}

impl std::fmt::Display for DepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a dependence edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepEdge {
    /// Combined operand index that caused the dependence.
    pub operand: usize,
    /// Which access pair produced the edge.
    pub kind: DepKind,
    /// Minimum latency in cycles between source start and target start.
    pub weight: u64,
}

/// Payload of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Virtual writer of every operand before the first gate.
    Source,
    /// Virtual reader and writer of every operand after the last gate.
    Sink,
    /// A real gate, identified by its index in the kernel's program order.
    Gate(usize),
}

/// How a gate touches one combined operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Write,
    Read,
    ControlledTarget,
}

/// The dependence graph for one kernel, built once per scheduling run.
pub struct DepGraph {
    graph: DiGraph<NodeKind, DepEdge>,
    source: NodeIndex,
    sink: NodeIndex,
    nodes: Vec<NodeIndex>,
}

impl DepGraph {
    /// Build the dependence graph for a kernel.
    ///
    /// Fails with [`ScheduleError::NotADag`] if the result contains a cycle,
    /// which cannot happen through this builder and would indicate a bug.
    pub fn build(kernel: &Kernel, platform: &Platform, commute: bool) -> ScheduleResult<Self> {
        debug!(
            "building dependence graph for kernel '{}': {} gates, {} qubits, {} cregs",
            kernel.name,
            kernel.len(),
            kernel.qubit_count,
            kernel.creg_count
        );
        let operand_count = kernel.combined_operand_count();

        let mut graph = DiGraph::with_capacity(kernel.len() + 2, kernel.len() * 2);
        let source = graph.add_node(NodeKind::Source);

        let mut builder = Builder {
            graph,
            kernel,
            cycle_time: platform.cycle_time,
            commute,
            last_writer: vec![source; operand_count],
            last_readers: vec![Vec::new(); operand_count],
            last_ds: vec![Vec::new(); operand_count],
        };

        let mut nodes = Vec::with_capacity(kernel.len());
        for (index, gate) in kernel.gates().iter().enumerate() {
            let node = builder.graph.add_node(NodeKind::Gate(index));
            nodes.push(node);
            trace!("adding node for {}", gate.qasm());

            // All edges for this gate are emitted against the bookkeeping as
            // it stood before the gate; only then is the bookkeeping updated.
            let events = accesses(gate, kernel.qubit_count, operand_count);
            for &(operand, access) in &events {
                builder.emit(node, operand, access);
            }
            for &(operand, access) in &events {
                builder.commit(node, operand, access);
            }
        }

        // The sink writes every operand, gathering every dangling chain.
        let sink = builder.graph.add_node(NodeKind::Sink);
        for operand in 0..operand_count {
            builder.emit(sink, operand, Access::Write);
        }

        let graph = builder.graph;
        if petgraph::algo::is_cyclic_directed(&graph) {
            return Err(ScheduleError::NotADag);
        }
        debug!(
            "dependence graph done: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(Self {
            graph,
            source,
            sink,
            nodes,
        })
    }

    /// The source sentinel.
    #[inline]
    pub fn source(&self) -> NodeIndex {
        self.source
    }

    /// The sink sentinel.
    #[inline]
    pub fn sink(&self) -> NodeIndex {
        self.sink
    }

    /// Total node count, sentinels included.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Total edge count.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The node for the gate at `gate_index` in program order.
    #[inline]
    pub fn node_of(&self, gate_index: usize) -> NodeIndex {
        self.nodes[gate_index]
    }

    /// The payload of a node.
    #[inline]
    pub fn kind(&self, node: NodeIndex) -> NodeKind {
        self.graph[node]
    }

    /// The kernel gate index behind a node, if it is not a sentinel.
    pub fn gate_index(&self, node: NodeIndex) -> Option<usize> {
        match self.graph[node] {
            NodeKind::Gate(index) => Some(index),
            _ => None,
        }
    }

    /// Check if a node is the source or the sink.
    #[inline]
    pub fn is_sentinel(&self, node: NodeIndex) -> bool {
        node == self.source || node == self.sink
    }

    /// Incoming edges of a node as `(source, edge)` pairs.
    pub fn in_edges(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, DepEdge)> + '_ {
        self.graph
            .edges_directed(node, Incoming)
            .map(|e| (e.source(), *e.weight()))
    }

    /// Outgoing edges of a node as `(target, edge)` pairs.
    pub fn out_edges(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, DepEdge)> + '_ {
        self.graph
            .edges_directed(node, Outgoing)
            .map(|e| (e.target(), *e.weight()))
    }

    /// All edges as `(source, target, edge)` triples.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, DepEdge)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
    }

    /// All node indices.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Direct dependents of a node in the given scheduling direction,
    /// without duplicates.
    ///
    /// Duplicates arise from parallel edges between the same node pair
    /// (one per operand and kind); the schedulers only care about the nodes.
    pub fn dependents(&self, node: NodeIndex, direction: Direction) -> Vec<NodeIndex> {
        let petgraph_dir = if direction.is_forward() {
            Outgoing
        } else {
            Incoming
        };
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for n in self.graph.neighbors_directed(node, petgraph_dir) {
            if seen.insert(n) {
                out.push(n);
            }
        }
        out
    }

    /// Nodes that must be scheduled before `node` in the given direction.
    /// May repeat a node once per parallel edge.
    pub fn prerequisites(
        &self,
        node: NodeIndex,
        direction: Direction,
    ) -> impl Iterator<Item = NodeIndex> + '_ {
        let petgraph_dir = if direction.is_forward() {
            Incoming
        } else {
            Outgoing
        };
        self.graph.neighbors_directed(node, petgraph_dir)
    }
}

/// Construction state: per-operand bookkeeping plus the growing graph.
struct Builder<'k> {
    graph: DiGraph<NodeKind, DepEdge>,
    kernel: &'k Kernel,
    cycle_time: u64,
    commute: bool,
    last_writer: Vec<NodeIndex>,
    last_readers: Vec<Vec<NodeIndex>>,
    last_ds: Vec<Vec<NodeIndex>>,
}

impl Builder<'_> {
    /// Edge weight contributed by a source node: its duration in cycles.
    /// The source sentinel takes one full cycle, so the first gates land at
    /// cycle 1; the sink contributes nothing (it has no out-edges anyway).
    fn weight_of(&self, node: NodeIndex) -> u64 {
        match self.graph[node] {
            NodeKind::Source => 1,
            NodeKind::Sink => 0,
            NodeKind::Gate(index) => {
                self.kernel.gates()[index].duration_in_cycles(self.cycle_time)
            }
        }
    }

    fn add_dep(&mut self, src: NodeIndex, tgt: NodeIndex, kind: DepKind, operand: usize) {
        let weight = self.weight_of(src);
        trace!(
            "dep {:?} -> {:?} (operand {operand}, {kind}, weight {weight})",
            src,
            tgt
        );
        self.graph.add_edge(
            src,
            tgt,
            DepEdge {
                operand,
                kind,
                weight,
            },
        );
    }

    /// Emit the dependences the event table prescribes for one access.
    fn emit(&mut self, node: NodeIndex, operand: usize, access: Access) {
        let writer = self.last_writer[operand];
        let readers = self.last_readers[operand].clone();
        let ds = self.last_ds[operand].clone();
        match access {
            Access::Write => {
                self.add_dep(writer, node, DepKind::Waw, operand);
                for r in readers {
                    self.add_dep(r, node, DepKind::War, operand);
                }
                for d in ds {
                    self.add_dep(d, node, DepKind::Wad, operand);
                }
            }
            Access::Read => {
                self.add_dep(writer, node, DepKind::Raw, operand);
                if !self.commute {
                    for r in readers {
                        self.add_dep(r, node, DepKind::Rar, operand);
                    }
                }
                for d in ds {
                    self.add_dep(d, node, DepKind::Rad, operand);
                }
            }
            Access::ControlledTarget => {
                self.add_dep(writer, node, DepKind::Daw, operand);
                if !self.commute {
                    for d in ds {
                        self.add_dep(d, node, DepKind::Dad, operand);
                    }
                }
                for r in readers {
                    self.add_dep(r, node, DepKind::Dar, operand);
                }
            }
        }
    }

    /// Update the per-operand bookkeeping after the edges were emitted.
    fn commit(&mut self, node: NodeIndex, operand: usize, access: Access) {
        match access {
            Access::Write => {
                self.last_writer[operand] = node;
                self.last_readers[operand].clear();
                self.last_ds[operand].clear();
            }
            Access::Read => {
                self.last_readers[operand].push(node);
                self.last_ds[operand].clear();
            }
            Access::ControlledTarget => {
                self.last_ds[operand].push(node);
                self.last_readers[operand].clear();
            }
        }
    }
}

/// The access events a gate performs, keyed by combined operand.
fn accesses(gate: &Gate, qubit_count: usize, operand_count: usize) -> Vec<(usize, Access)> {
    match gate.kind {
        GateKind::Measure => gate
            .qubits
            .iter()
            .map(|q| (q.index(), Access::Write))
            .chain(
                gate.cregs
                    .iter()
                    .map(|c| (c.combined_index(qubit_count), Access::Write)),
            )
            .collect(),
        // No explicit operands: a display barriers the whole operand space.
        GateKind::Display => (0..operand_count).map(|o| (o, Access::Write)).collect(),
        GateKind::Classical => gate
            .cregs
            .iter()
            .map(|c| (c.combined_index(qubit_count), Access::Write))
            .collect(),
        // Control reads, target is the controlled-target access.
        GateKind::Cnot => gate
            .qubits
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let access = if i == 0 {
                    Access::Read
                } else {
                    Access::ControlledTarget
                };
                (q.index(), access)
            })
            .collect(),
        GateKind::Cz => gate
            .qubits
            .iter()
            .map(|q| (q.index(), Access::Read))
            .collect(),
        GateKind::Wait | GateKind::Remap | GateKind::Dummy | GateKind::Generic => gate
            .qubits
            .iter()
            .map(|q| (q.index(), Access::Write))
            .chain(
                gate.cregs
                    .iter()
                    .map(|c| (c.combined_index(qubit_count), Access::Write)),
            )
            .collect(),
    }
}

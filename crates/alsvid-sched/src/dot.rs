//! DOT rendering of the dependence graph.
//!
//! Emission only: nothing ever reads these files back. Nodes are labeled
//! with the gate text, edges with the operand, weight and dependence kind
//! that produced them. When cycles have been assigned, a plaintext timeline
//! spine `Cycle0 -> Cycle1 -> ...` is emitted and every node is ranked with
//! its cycle, so layout engines draw the schedule as a time axis.

use std::fmt::Write as _;

use alsvid_ir::Kernel;
use petgraph::graph::NodeIndex;

use crate::depgraph::{DepGraph, NodeKind};

/// Render `graph` with per-node `cycles` as rank constraints.
pub(crate) fn render(graph: &DepGraph, kernel: &Kernel, cycles: &[u64], cycle_time: u64) -> String {
    let mut out = String::new();
    out.push_str("digraph {\n");
    out.push_str("graph [ rankdir=TD; ];\n");
    out.push_str("edge [fontsize=16, arrowhead=vee, arrowsize=0.5];\n");

    for node in graph.node_indices() {
        let _ = writeln!(
            out,
            "\"{}\" [label=\" {} \" fontcolor=black, style=filled, fontsize=16];",
            node.index(),
            node_label(graph, kernel, node)
        );
    }

    let total_cycles = timeline_span(kernel, cycle_time);
    out.push_str("{\nnode [shape=plaintext, fontsize=16, fontcolor=blue];\n");
    for cycle in 0..=total_cycles {
        if cycle > 0 {
            out.push_str(" -> ");
        }
        let _ = write!(out, "Cycle{cycle}");
    }
    out.push_str(";\n}\n");

    for node in graph.node_indices() {
        let cycle = cycles[node.index()];
        if cycle <= total_cycles {
            let _ = writeln!(out, "{{ rank=same; Cycle{cycle}; {}; }}", node.index());
        }
    }

    for (src, tgt, edge) in graph.edges() {
        let _ = writeln!(
            out,
            "\"{}\"->\"{}\"[ label=\"q{}, {}, {}\" color=black ]",
            src.index(),
            tgt.index(),
            edge.operand,
            edge.weight,
            edge.kind
        );
    }

    out.push_str("}\n");
    out
}

fn node_label(graph: &DepGraph, kernel: &Kernel, node: NodeIndex) -> String {
    match graph.kind(node) {
        NodeKind::Source => "SOURCE".to_string(),
        NodeKind::Sink => "SINK".to_string(),
        NodeKind::Gate(index) => kernel.gates()[index].qasm(),
    }
}

/// Number of the last cycle on the timeline: the full span from the source
/// through the completion of the latest gate.
fn timeline_span(kernel: &Kernel, cycle_time: u64) -> u64 {
    let first = kernel
        .gates()
        .iter()
        .filter(|g| g.is_scheduled())
        .map(|g| g.cycle)
        .min();
    match first {
        // +1 covers the source's own cycle
        Some(first) => kernel.depth(cycle_time) - first + 1,
        None => 1,
    }
}

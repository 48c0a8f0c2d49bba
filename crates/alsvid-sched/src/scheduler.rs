//! Cycle assignment and the resource-constrained list scheduler.
//!
//! A [`Scheduler`] owns one scheduling run: it holds the dependence graph,
//! the per-node cycle and criticality tables, and an exclusive borrow of the
//! kernel. The consuming `schedule_*` methods assign every gate a cycle,
//! write the cycles back, and leave the kernel stably sorted by cycle.

use petgraph::graph::NodeIndex;
use tracing::{debug, trace};

use alsvid_ir::{Gate, GateKind, Kernel};

use crate::config::SchedulerConfig;
use crate::depgraph::{DepGraph, NodeKind};
use crate::dot;
use crate::error::{ScheduleError, ScheduleResult};
use crate::platform::Platform;
use crate::resource::{Direction, ResourceManager};

/// Cycle the sink starts from when solving backward.
///
/// Far larger than any real schedule, far smaller than where adding an edge
/// weight could overflow.
pub const ALAP_SINK_CYCLE: u64 = u64::MAX / 4;

/// One scheduling run over one kernel.
///
/// The dependence graph is built on construction and never modified by the
/// schedulers; only the cycle table changes. Each `schedule_*` method
/// consumes the run, so a graph cannot be scheduled twice against stale
/// bookkeeping.
pub struct Scheduler<'k> {
    pub(crate) kernel: &'k mut Kernel,
    pub(crate) platform: Platform,
    pub(crate) config: SchedulerConfig,
    pub(crate) graph: DepGraph,
    /// Cycle per node, sentinels included, indexed by node index.
    pub(crate) cycles: Vec<u64>,
    /// Longest weighted path to the terminal sentinel, per node.
    pub(crate) remaining: Vec<u64>,
}

impl<'k> Scheduler<'k> {
    /// Build the dependence graph for `kernel` and prepare a run.
    pub fn new(
        kernel: &'k mut Kernel,
        platform: &Platform,
        config: &SchedulerConfig,
    ) -> ScheduleResult<Scheduler<'k>> {
        let graph = DepGraph::build(kernel, platform, config.commute)?;
        let node_count = graph.node_count();
        Ok(Self {
            kernel,
            platform: *platform,
            config: config.clone(),
            graph,
            cycles: vec![0; node_count],
            remaining: vec![0; node_count],
        })
    }

    /// ASAP without resource constraints.
    pub fn schedule_asap(mut self) -> Option<String> {
        debug!("scheduling '{}' ASAP", self.kernel.name);
        self.assign_cycles(Direction::Forward);
        self.finish()
    }

    /// ALAP without resource constraints.
    pub fn schedule_alap(mut self) -> Option<String> {
        debug!("scheduling '{}' ALAP", self.kernel.name);
        self.assign_cycles(Direction::Backward);
        self.finish()
    }

    /// ASAP under resource constraints.
    pub fn schedule_asap_rc(
        mut self,
        rm: &mut dyn ResourceManager,
    ) -> ScheduleResult<Option<String>> {
        self.schedule_with_resources(Direction::Forward, rm)?;
        Ok(self.finish())
    }

    /// ALAP under resource constraints.
    pub fn schedule_alap_rc(
        mut self,
        rm: &mut dyn ResourceManager,
    ) -> ScheduleResult<Option<String>> {
        self.schedule_with_resources(Direction::Backward, rm)?;
        Ok(self.finish())
    }

    /// DOT rendering of the dependence graph, with ASAP cycles as ranks.
    ///
    /// Does not reorder the kernel; a `schedule_*` call may follow.
    pub fn dependence_dot(&mut self) -> String {
        self.assign_cycles(Direction::Forward);
        self.flush_cycles();
        dot::render(&self.graph, self.kernel, &self.cycles, self.platform.cycle_time)
    }

    /// Write cycles into the gates, render DOT if configured, sort the kernel.
    pub(crate) fn finish(mut self) -> Option<String> {
        self.flush_cycles();
        let rendered = if self.config.print_dot_graphs {
            Some(dot::render(
                &self.graph,
                self.kernel,
                &self.cycles,
                self.platform.cycle_time,
            ))
        } else {
            None
        };
        self.kernel.sort_by_cycle();
        rendered
    }

    pub(crate) fn flush_cycles(&mut self) {
        let Self {
            kernel,
            graph,
            cycles,
            ..
        } = self;
        for (index, gate) in kernel.gates_mut().iter_mut().enumerate() {
            gate.cycle = cycles[graph.node_of(index).index()];
        }
    }

    /// Recompute one node's cycle from its already-cycled neighbors.
    ///
    /// Forward: the earliest cycle at which every predecessor has completed.
    /// Backward: the latest cycle from which every successor is still
    /// reachable in time.
    pub(crate) fn assign_cycle(&mut self, node: NodeIndex, direction: Direction) {
        let cycle = match direction {
            Direction::Forward => self
                .graph
                .in_edges(node)
                .map(|(src, edge)| self.cycles[src.index()] + edge.weight)
                .max()
                .unwrap_or(0),
            Direction::Backward => self
                .graph
                .out_edges(node)
                .map(|(tgt, edge)| self.cycles[tgt.index()].saturating_sub(edge.weight))
                .min()
                .unwrap_or(ALAP_SINK_CYCLE),
        };
        self.cycles[node.index()] = cycle;
    }

    /// Longest-path cycle assignment over the whole graph.
    ///
    /// The kernel's program order is a topological order of the graph by
    /// construction, so one pass suffices in either direction. Backward
    /// assignment finishes by shifting everything down so the source lands
    /// at cycle 0; the sink then sits at the schedule depth.
    pub(crate) fn assign_cycles(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => {
                self.cycles[self.graph.source().index()] = 0;
                for index in 0..self.kernel.len() {
                    let node = self.graph.node_of(index);
                    self.assign_cycle(node, direction);
                }
                let sink = self.graph.sink();
                self.assign_cycle(sink, direction);
            }
            Direction::Backward => {
                self.cycles[self.graph.sink().index()] = ALAP_SINK_CYCLE;
                for index in (0..self.kernel.len()).rev() {
                    let node = self.graph.node_of(index);
                    self.assign_cycle(node, direction);
                }
                let source = self.graph.source();
                self.assign_cycle(source, direction);
                self.rebase_on_source();
            }
        }
    }

    /// Shift every node's cycle down so the source sits at 0.
    pub(crate) fn rebase_on_source(&mut self) {
        let base = self.cycles[self.graph.source().index()];
        for cycle in &mut self.cycles {
            *cycle = cycle.saturating_sub(base);
        }
    }

    /// Fill `remaining` with the longest weighted path from each node to the
    /// terminal sentinel of the given direction.
    pub(crate) fn set_remaining(&mut self, direction: Direction) {
        self.remaining.fill(0);
        match direction {
            Direction::Forward => {
                for index in (0..self.kernel.len()).rev() {
                    let node = self.graph.node_of(index);
                    self.set_remaining_node(node, direction);
                }
                let source = self.graph.source();
                self.set_remaining_node(source, direction);
            }
            Direction::Backward => {
                for index in 0..self.kernel.len() {
                    let node = self.graph.node_of(index);
                    self.set_remaining_node(node, direction);
                }
                let sink = self.graph.sink();
                self.set_remaining_node(sink, direction);
            }
        }
    }

    fn set_remaining_node(&mut self, node: NodeIndex, direction: Direction) {
        let value = match direction {
            Direction::Forward => self
                .graph
                .out_edges(node)
                .map(|(tgt, edge)| self.remaining[tgt.index()] + edge.weight)
                .max()
                .unwrap_or(0),
            Direction::Backward => self
                .graph
                .in_edges(node)
                .map(|(src, edge)| self.remaining[src.index()] + edge.weight)
                .max()
                .unwrap_or(0),
        };
        self.remaining[node.index()] = value;
    }

    /// Deep criticality: is `a` strictly less critical than `b`?
    ///
    /// Primary key is the `remaining` value. Ties recurse into the direct
    /// dependents: compare their best `remaining`, then how many dependents
    /// attain it, then the most critical of those, by this very relation.
    /// Recursion descends the DAG towards the terminal sentinel, so it
    /// terminates.
    pub(crate) fn less_critical(&self, a: NodeIndex, b: NodeIndex, direction: Direction) -> bool {
        if a == b {
            return false;
        }
        let remaining_a = self.remaining[a.index()];
        let remaining_b = self.remaining[b.index()];
        if remaining_a != remaining_b {
            return remaining_a < remaining_b;
        }

        let deps_a = self.graph.dependents(a, direction);
        let deps_b = self.graph.dependents(b, direction);
        if deps_b.is_empty() {
            return false;
        }
        if deps_a.is_empty() {
            return true;
        }

        let crit = |deps: &[NodeIndex]| {
            deps.iter()
                .map(|d| self.remaining[d.index()])
                .max()
                .unwrap_or(0)
        };
        let crit_a = crit(&deps_a);
        let crit_b = crit(&deps_b);
        if crit_a != crit_b {
            return crit_a < crit_b;
        }

        let top_a: Vec<NodeIndex> = deps_a
            .into_iter()
            .filter(|d| self.remaining[d.index()] == crit_a)
            .collect();
        let top_b: Vec<NodeIndex> = deps_b
            .into_iter()
            .filter(|d| self.remaining[d.index()] == crit_b)
            .collect();
        if top_a.len() != top_b.len() {
            return top_a.len() < top_b.len();
        }

        let deepest = |nodes: Vec<NodeIndex>| {
            nodes
                .into_iter()
                .reduce(|best, n| if self.less_critical(best, n, direction) { n } else { best })
        };
        match (deepest(top_a), deepest(top_b)) {
            (Some(da), Some(db)) => self.less_critical(da, db, direction),
            _ => false,
        }
    }

    /// The list scheduler: repeatedly pick the most critical ready node that
    /// the resource manager admits at the current cycle, advancing the cycle
    /// whenever nothing is admissible.
    pub(crate) fn schedule_with_resources(
        &mut self,
        direction: Direction,
        rm: &mut dyn ResourceManager,
    ) -> ScheduleResult<()> {
        debug!(
            "scheduling '{}' {} with resource constraints",
            self.kernel.name,
            if direction.is_forward() { "ASAP" } else { "ALAP" }
        );
        let mut scheduled = vec![false; self.graph.node_count()];
        self.set_remaining(direction);

        let start = if direction.is_forward() {
            self.graph.source()
        } else {
            self.graph.sink()
        };
        // remaining[start] is the critical path length; a correct resource
        // manager admits something well within a few multiples of it
        let stall_limit = self
            .config
            .stall_limit
            .unwrap_or_else(|| (self.remaining[start.index()] * 4).max(64));

        let mut curr_cycle = if direction.is_forward() {
            0
        } else {
            ALAP_SINK_CYCLE
        };
        self.cycles[start.index()] = curr_cycle;
        let mut avlist: Vec<NodeIndex> = vec![start];
        let mut stalled: u64 = 0;

        while !avlist.is_empty() {
            let Some(position) = self.select_available(&avlist, direction, curr_cycle, rm) else {
                stalled += 1;
                if stalled > stall_limit {
                    return Err(ScheduleError::ResourceStarvation {
                        gate: self.node_name(avlist[0]),
                        cycles_stalled: stalled,
                        limit: stall_limit,
                    });
                }
                curr_cycle = if direction.is_forward() {
                    curr_cycle + 1
                } else {
                    curr_cycle - 1
                };
                continue;
            };
            stalled = 0;

            let node = avlist.remove(position);
            self.cycles[node.index()] = curr_cycle;
            trace!("committed {} at cycle {curr_cycle}", self.node_name(node));
            if !self.bypasses_resources(node) {
                if let Some(gate) = self.gate_of(node) {
                    rm.reserve(curr_cycle, gate, &self.platform);
                }
            }
            scheduled[node.index()] = true;

            // a dependent becomes ready once everything it depends on in
            // this direction has been committed
            for dependent in self.graph.dependents(node, direction) {
                let ready = self
                    .graph
                    .prerequisites(dependent, direction)
                    .all(|p| scheduled[p.index()]);
                if ready {
                    self.make_available(dependent, &mut avlist, direction);
                }
            }
        }

        if !direction.is_forward() {
            self.rebase_on_source();
        }
        Ok(())
    }

    /// First node in the avlist that can be committed at `curr_cycle`.
    /// The avlist is ordered most-critical first, so the first hit wins.
    fn select_available(
        &self,
        avlist: &[NodeIndex],
        direction: Direction,
        curr_cycle: u64,
        rm: &dyn ResourceManager,
    ) -> Option<usize> {
        avlist
            .iter()
            .position(|&node| self.immediately_schedulable(node, direction, curr_cycle, rm))
    }

    /// A node is immediately schedulable when its recomputed cycle has been
    /// reached (all dependences satisfied at `curr_cycle`) and the resource
    /// manager admits it, unless it bypasses resources altogether.
    fn immediately_schedulable(
        &self,
        node: NodeIndex,
        direction: Direction,
        curr_cycle: u64,
        rm: &dyn ResourceManager,
    ) -> bool {
        let cycle = self.cycles[node.index()];
        let dependences_met = if direction.is_forward() {
            cycle <= curr_cycle
        } else {
            curr_cycle <= cycle
        };
        if !dependences_met {
            return false;
        }
        if self.bypasses_resources(node) {
            return true;
        }
        match self.gate_of(node) {
            Some(gate) => rm.available(curr_cycle, gate, &self.platform),
            None => true,
        }
    }

    /// Insert a freshly ready node into the avlist, keeping it ordered from
    /// highest to lowest deep criticality. Ties insert after their equals,
    /// so earlier-ready nodes keep precedence.
    fn make_available(
        &mut self,
        node: NodeIndex,
        avlist: &mut Vec<NodeIndex>,
        direction: Direction,
    ) {
        // parallel edges can nominate the same node more than once
        if avlist.contains(&node) {
            return;
        }
        self.assign_cycle(node, direction);
        trace!(
            "available {} (cycle {}, remaining {})",
            self.node_name(node),
            self.cycles[node.index()],
            self.remaining[node.index()]
        );
        match avlist
            .iter()
            .position(|&entry| self.less_critical(entry, node, direction))
        {
            Some(position) => avlist.insert(position, node),
            None => avlist.push(node),
        }
    }

    /// Sentinels and pseudo-gates never occupy hardware resources.
    fn bypasses_resources(&self, node: NodeIndex) -> bool {
        if self.graph.is_sentinel(node) {
            return true;
        }
        match self.gate_of(node) {
            Some(gate) => matches!(
                gate.kind,
                GateKind::Dummy | GateKind::Classical | GateKind::Wait | GateKind::Remap
            ),
            None => true,
        }
    }

    fn gate_of(&self, node: NodeIndex) -> Option<&Gate> {
        self.graph
            .gate_index(node)
            .map(|index| &self.kernel.gates()[index])
    }

    pub(crate) fn node_name(&self, node: NodeIndex) -> String {
        match self.graph.kind(node) {
            NodeKind::Source => "SOURCE".to_string(),
            NodeKind::Sink => "SINK".to_string(),
            NodeKind::Gate(index) => self.kernel.gates()[index].qasm(),
        }
    }
}

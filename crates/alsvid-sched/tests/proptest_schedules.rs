//! Property-based tests over random straight-line kernels.
//!
//! Every schedule any of the schedulers produces must honor the dependence
//! graph of the original program order, keep program order among gates that
//! share a cycle, and place real gates strictly after the source. ALAP and
//! ASAP agree on the depth, uniforming never extends it, and commutation
//! can only shorten it.

use std::collections::HashMap;

use proptest::prelude::*;

use alsvid_ir::{CregId, Gate, Kernel, QubitId};
use alsvid_sched::{
    rcschedule_kernel, schedule_kernel, DepGraph, Direction, NodeKind, Platform, QubitResources,
    SchedulerConfig, SchedulerKind,
};

#[derive(Debug, Clone)]
enum Op {
    Single(u32, u64),
    Cnot(u32, u32, u64),
    Cz(u32, u32, u64),
    Measure(u32, u64),
}

fn arb_op(qubits: u32) -> BoxedStrategy<Op> {
    if qubits < 2 {
        prop_oneof![
            (0..qubits, 1..=3u64).prop_map(|(q, d)| Op::Single(q, d)),
            (0..qubits, 1..=3u64).prop_map(|(q, d)| Op::Measure(q, d)),
        ]
        .boxed()
    } else {
        let pair = (0..qubits, 0..qubits, 1..=3u64)
            .prop_filter("operands must differ", |(a, b, _)| a != b);
        prop_oneof![
            (0..qubits, 1..=3u64).prop_map(|(q, d)| Op::Single(q, d)),
            pair.clone().prop_map(|(c, t, d)| Op::Cnot(c, t, d)),
            pair.prop_map(|(a, b, d)| Op::Cz(a, b, d)),
            (0..qubits, 1..=3u64).prop_map(|(q, d)| Op::Measure(q, d)),
        ]
        .boxed()
    }
}

fn arb_kernel() -> impl Strategy<Value = Kernel> {
    (1..=4u32).prop_flat_map(|qubits| {
        prop::collection::vec(arb_op(qubits), 0..=10).prop_map(move |ops| {
            let mut kernel = Kernel::new("prop", qubits as usize, qubits as usize);
            for (position, op) in ops.into_iter().enumerate() {
                let mut gate = match op {
                    Op::Single(q, d) => Gate::generic("g", [QubitId(q)], d),
                    Op::Cnot(c, t, d) => Gate::cnot(QubitId(c), QubitId(t), d),
                    Op::Cz(a, b, d) => Gate::cz(QubitId(a), QubitId(b), d),
                    Op::Measure(q, d) => Gate::measure(QubitId(q), CregId(q), d),
                };
                gate.name = format!("g{position}");
                kernel.push(gate);
            }
            kernel
        })
    })
}

fn schedule_clone(kernel: &Kernel, platform: &Platform, config: &SchedulerConfig) -> Kernel {
    let mut scheduled = kernel.clone();
    schedule_kernel(&mut scheduled, platform, config).unwrap();
    scheduled
}

fn check_schedule(original: &Kernel, scheduled: &Kernel, platform: &Platform, commute: bool) {
    let cycles: HashMap<String, u64> = scheduled
        .gates()
        .iter()
        .map(|g| (g.name.clone(), g.cycle))
        .collect();

    // real gates sit strictly after the source
    for gate in scheduled.gates() {
        assert!(gate.is_scheduled());
        assert!(gate.cycle >= 1, "{} scheduled at the source", gate.qasm());
    }

    // program order survives among equal cycles
    let position = |g: &Gate| -> usize { g.name.trim_start_matches('g').parse().unwrap() };
    for pair in scheduled.gates().windows(2) {
        assert!(pair[0].cycle <= pair[1].cycle);
        if pair[0].cycle == pair[1].cycle {
            assert!(position(&pair[0]) < position(&pair[1]));
        }
    }

    // every dependence edge of the original order holds
    if original.is_empty() {
        return;
    }
    let graph = DepGraph::build(original, platform, commute).unwrap();
    let sink_cycle = scheduled.depth(platform.cycle_time).max(1);
    let cycle_of = |node| match graph.kind(node) {
        NodeKind::Source => 0,
        NodeKind::Sink => sink_cycle,
        NodeKind::Gate(index) => cycles[&original.gates()[index].name],
    };
    for (src, tgt, edge) in graph.edges() {
        assert!(
            cycle_of(src) + edge.weight <= cycle_of(tgt),
            "dependence violated on operand {}",
            edge.operand
        );
    }
}

proptest! {
    #[test]
    fn prop_asap_and_alap_honor_dependences(kernel in arb_kernel(), commute in any::<bool>()) {
        let platform = Platform::new(2, kernel.qubit_count);
        for kind in [SchedulerKind::Asap, SchedulerKind::Alap] {
            let config = SchedulerConfig::default()
                .with_scheduler(kind)
                .with_commute(commute);
            let scheduled = schedule_clone(&kernel, &platform, &config);
            prop_assert!(scheduled.cycles_valid);
            check_schedule(&kernel, &scheduled, &platform, commute);
        }
    }

    #[test]
    fn prop_alap_matches_asap_depth(kernel in arb_kernel()) {
        let platform = Platform::new(2, kernel.qubit_count);
        let asap = schedule_clone(&kernel, &platform, &SchedulerConfig::default());
        let alap = schedule_clone(
            &kernel,
            &platform,
            &SchedulerConfig::default().with_scheduler(SchedulerKind::Alap),
        );
        prop_assert_eq!(asap.depth(2), alap.depth(2));
    }

    #[test]
    fn prop_uniform_preserves_depth(kernel in arb_kernel(), commute in any::<bool>()) {
        let platform = Platform::new(2, kernel.qubit_count);
        let config = SchedulerConfig::default().with_commute(commute);
        let asap = schedule_clone(&kernel, &platform, &config);
        let uniform = schedule_clone(&kernel, &platform, &config.clone().with_uniform(true));
        prop_assert_eq!(asap.depth(2), uniform.depth(2));
        check_schedule(&kernel, &uniform, &platform, commute);
    }

    #[test]
    fn prop_commutation_never_deepens(kernel in arb_kernel()) {
        let platform = Platform::new(2, kernel.qubit_count);
        let ordered = schedule_clone(&kernel, &platform, &SchedulerConfig::default());
        let commuting = schedule_clone(
            &kernel,
            &platform,
            &SchedulerConfig::default().with_commute(true),
        );
        prop_assert!(commuting.depth(2) <= ordered.depth(2));
    }

    #[test]
    fn prop_rc_schedules_are_exclusive(kernel in arb_kernel(), commute in any::<bool>()) {
        let platform = Platform::new(2, kernel.qubit_count);
        let config = SchedulerConfig::default().with_commute(commute);
        let mut scheduled = kernel.clone();
        let mut rm = QubitResources::new(&platform, Direction::Forward);
        rcschedule_kernel(&mut scheduled, &platform, &config, &mut rm).unwrap();
        check_schedule(&kernel, &scheduled, &platform, commute);

        // no two gates overlap on a qubit
        for qubit in 0..scheduled.qubit_count as u32 {
            let mut windows: Vec<(u64, u64)> = scheduled
                .gates()
                .iter()
                .filter(|g| g.qubits.contains(&QubitId(qubit)))
                .map(|g| (g.cycle, g.cycle + g.duration_in_cycles(2)))
                .collect();
            windows.sort_unstable();
            for pair in windows.windows(2) {
                prop_assert!(pair[0].1 <= pair[1].0, "qubit {} double-booked", qubit);
            }
        }
    }
}

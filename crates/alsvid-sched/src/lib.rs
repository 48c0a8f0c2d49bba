//! Alsvid Scheduling
//!
//! A dependence-graph list scheduler for straight-line quantum circuits.
//! Given a kernel of gates over qubits and classical registers, the
//! schedulers assign every gate a cycle such that all data and control
//! dependences hold, optional hardware resource constraints are honored,
//! and one of four objectives is met:
//!
//! - **ASAP**: every gate as early as its dependences allow
//! - **ALAP**: every gate as late as possible without growing the depth
//! - **Resource-constrained ASAP/ALAP**: a criticality-driven list scheduler
//!   consulting a [`ResourceManager`]
//! - **Uniform**: an ASAP seed rebalanced so bundle sizes even out, at the
//!   same depth
//!
//! # Architecture
//!
//! ```text
//! Kernel (alsvid-ir)
//!       │
//!       ▼
//! ┌────────────┐   per-kind access events (W/R/D),
//! │  DepGraph  │◄─ commutation-aware edges,
//! └────────────┘   SOURCE/SINK sentinels
//!       │
//!       ▼
//! ┌────────────┐   cycle solver, criticality oracle,
//! │  Scheduler │◄─ list scheduler, uniforming pass
//! └────────────┘
//!       │
//!       ▼
//! Kernel with cycles assigned, sorted, cycles_valid set
//! ```
//!
//! # Example
//!
//! ```rust
//! use alsvid_ir::{Gate, Kernel, QubitId};
//! use alsvid_sched::{schedule_kernel, Platform, SchedulerConfig};
//!
//! let mut kernel = Kernel::new("demo", 2, 0);
//! kernel.push(Gate::generic("h", [QubitId(0)], 40));
//! kernel.push(Gate::cnot(QubitId(0), QubitId(1), 80));
//!
//! let platform = Platform::new(20, 2);
//! schedule_kernel(&mut kernel, &platform, &SchedulerConfig::default()).unwrap();
//!
//! assert!(kernel.cycles_valid);
//! assert_eq!(kernel.gates()[0].cycle, 1);
//! assert_eq!(kernel.gates()[1].cycle, 3);
//! ```
//!
//! # Commutation
//!
//! With [`SchedulerConfig::commute`] enabled, the dependence graph encodes
//! that CNOTs sharing a control commute, CNOTs sharing a target commute, and
//! CZ is symmetric in its operands, so such gates can share a cycle. The
//! resource layer still serializes real hardware conflicts.

pub mod config;
pub mod depgraph;
mod dot;
pub mod error;
pub mod platform;
pub mod resource;
pub mod schedule;
pub mod scheduler;
mod uniform;

pub use config::{SchedulerConfig, SchedulerKind};
pub use depgraph::{DepEdge, DepGraph, DepKind, NodeKind};
pub use error::{ScheduleError, ScheduleResult};
pub use platform::Platform;
pub use resource::{Direction, QubitResources, ResourceManager};
pub use schedule::{
    rcschedule_kernel, rcschedule_program, schedule_kernel, schedule_program, KernelSchedule,
};
pub use scheduler::{Scheduler, ALAP_SINK_CYCLE};

//! Alsvid Gate and Kernel Intermediate Representation
//!
//! This crate provides the data structures the Alsvid scheduling stack
//! consumes and annotates: operand identifiers, gate descriptors with a
//! scheduling-relevant kind tag, and kernels (straight-line circuits) grouped
//! into programs.
//!
//! The schedulers in `alsvid-sched` treat gates as read-only except for the
//! [`Gate::cycle`] slot, which a scheduling run assigns exactly once. A
//! kernel whose gates carry valid cycles is marked with
//! [`Kernel::cycles_valid`] and sorted by cycle, stably, so program order
//! survives among gates that share a cycle.
//!
//! # Example
//!
//! ```rust
//! use alsvid_ir::{Gate, Kernel, QubitId};
//!
//! let mut kernel = Kernel::new("bell", 2, 0);
//! kernel.push(Gate::generic("h", [QubitId(0)], 40));
//! kernel.push(Gate::cnot(QubitId(0), QubitId(1), 80));
//!
//! assert_eq!(kernel.len(), 2);
//! assert!(!kernel.gates()[0].is_scheduled());
//! ```

pub mod error;
pub mod gate;
pub mod kernel;
pub mod qubit;

pub use error::{IrError, IrResult};
pub use gate::{Gate, GateKind};
pub use kernel::{Kernel, Program};
pub use qubit::{CregId, QubitId};

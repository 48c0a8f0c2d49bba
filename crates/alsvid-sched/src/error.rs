//! Error types for the scheduling crate.

use thiserror::Error;

/// Errors that can occur while scheduling a kernel.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScheduleError {
    /// The dependence graph contains a cycle. This indicates a construction
    /// bug, not bad input: the builder only ever adds edges from earlier to
    /// later nodes.
    #[error("the dependence graph is not a DAG")]
    NotADag,

    /// A scheduler option value was not recognized.
    #[error("not a supported scheduler option: {0}")]
    UnknownScheduler(String),

    /// The resource manager never granted a gate and the stall cap was hit.
    #[error(
        "resource starvation on '{gate}': {cycles_stalled} cycle advances without progress (limit {limit})"
    )]
    ResourceStarvation {
        /// Textual rendering of the gate at the head of the available list.
        gate: String,
        /// How many consecutive cycle advances committed nothing.
        cycles_stalled: u64,
        /// The cap that was exceeded.
        limit: u64,
    },

    /// Writing a DOT rendering to the output directory failed.
    #[error("failed to write dot output")]
    DotIo(#[from] std::io::Error),
}

/// Result type for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

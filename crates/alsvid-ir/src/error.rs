//! Error types for the IR crate.

use thiserror::Error;

/// Errors that can occur when constructing kernels.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// A gate references an operand outside the kernel's operand space.
    #[error("gate '{gate}' references combined operand {operand}, kernel has {limit}")]
    OperandOutOfRange {
        /// Textual rendering of the offending gate.
        gate: String,
        /// The out-of-range combined operand index.
        operand: usize,
        /// Size of the kernel's combined operand space.
        limit: usize,
    },

    /// A gate was created with an empty name.
    #[error("gate name may not be empty")]
    EmptyName,
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;

//! Qubit and classical register identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a qubit within a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

impl From<usize> for QubitId {
    fn from(id: usize) -> Self {
        QubitId(u32::try_from(id).expect("QubitId overflow: exceeds u32::MAX"))
    }
}

impl QubitId {
    /// Index of this qubit in the combined operand space.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for a classical register within a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CregId(pub u32);

impl fmt::Display for CregId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for CregId {
    fn from(id: u32) -> Self {
        CregId(id)
    }
}

impl From<usize> for CregId {
    fn from(id: usize) -> Self {
        CregId(u32::try_from(id).expect("CregId overflow: exceeds u32::MAX"))
    }
}

impl CregId {
    /// Index of this register relative to the start of the register block.
    ///
    /// Register `r` lives at combined operand `qubit_count + r`; the caller
    /// supplies the qubit count to form the combined index.
    #[inline]
    pub fn combined_index(self, qubit_count: usize) -> usize {
        qubit_count + self.0 as usize
    }
}

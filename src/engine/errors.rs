//! Error types for the sizing engine
//!
//! This module defines [`SizeError`], covering everything that can fail
//! before or during a sizing call.  Configuration errors are fatal to the
//! call that made them; traversal exhaustion is *not* an error (it is
//! recovered per branch and reported through the sizer's missed count).

use std::fmt;

use crate::runtime::heap::ObjRef;

/// Errors surfaced by the sizing engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SizeError {
    /// Alignment must be a power of two (0 or 1 disables alignment).
    InvalidAlignment { align: usize },

    /// Profile cutoff must be a percentage in `0.0..=100.0`.
    InvalidCutoff { cutoff: f64 },

    /// A descriptor is already registered for this type key; registration
    /// is idempotent and never overwrites.
    DescriptorExists { key: String },

    /// A root object does not resolve in the heap.
    UnknownRoot { root: ObjRef },

    /// Snapshot history would exceed its memory budget.
    HistoryLimitExceeded { current: usize, limit: usize },
}

impl fmt::Display for SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeError::InvalidAlignment { align } => {
                write!(f, "invalid alignment {}: must be a power of two", align)
            }
            SizeError::InvalidCutoff { cutoff } => {
                write!(f, "invalid cutoff {}: must be within 0..=100", cutoff)
            }
            SizeError::DescriptorExists { key } => {
                write!(f, "descriptor already registered for {}", key)
            }
            SizeError::UnknownRoot { root } => {
                write!(f, "root object {} does not resolve in the heap", root)
            }
            SizeError::HistoryLimitExceeded { current, limit } => {
                write!(
                    f,
                    "snapshot history limit exceeded: {} bytes used, limit is {}",
                    current, limit
                )
            }
        }
    }
}

impl std::error::Error for SizeError {}

//! Traversal configuration
//!
//! [`SizeConfig`] collects every option a sizing call honors.  Defaults
//! mirror the reference policy: 8-byte alignment, recursion limit 100, code
//! excluded, denylisted kinds ignored, no detail records.

use crate::engine::errors::SizeError;

/// Configuration for one sizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeConfig {
    /// Size alignment boundary in bytes; must be a power of two.  Values of
    /// 0 or 1 disable alignment.
    pub align: usize,
    /// Recursion limit; 0 sizes the roots flat with no referent recursion.
    pub limit: usize,
    /// Include code-only descriptors (definitions, compiled code) in totals.
    pub code: bool,
    /// Derive descriptors for new types from a single known ancestor.
    pub derive: bool,
    /// Infer mapping-like types by duck-typed structural inspection.
    pub infer: bool,
    /// Depth below which detailed calls build named size records instead of
    /// raw sums.
    pub detail: usize,
    /// Honor the ignored category for runtime-machinery types.
    pub ignored: bool,
    /// Profile-report cutoff as a percentage of the grand total.
    pub cutoff: f64,
    /// Clip object descriptions to this many characters (0 disables).
    pub clip: usize,
}

impl Default for SizeConfig {
    fn default() -> Self {
        SizeConfig {
            align: 8,
            limit: 100,
            code: false,
            derive: false,
            infer: false,
            detail: 0,
            ignored: true,
            cutoff: 0.0,
            clip: 80,
        }
    }
}

impl SizeConfig {
    /// Check the configuration, returning the first invalid option.
    pub fn validate(&self) -> Result<(), SizeError> {
        if self.align > 1 && !self.align.is_power_of_two() {
            return Err(SizeError::InvalidAlignment { align: self.align });
        }
        if !(0.0..=100.0).contains(&self.cutoff) {
            return Err(SizeError::InvalidCutoff { cutoff: self.cutoff });
        }
        Ok(())
    }

    /// Alignment mask: `size` is rounded up with `(size + mask) & !mask`.
    pub fn mask(&self) -> usize {
        if self.align > 1 {
            self.align - 1
        } else {
            0
        }
    }
}

//! Length rules and over-allocation estimates
//!
//! A descriptor's length function is one of the closed set of
//! [`LengthRule`] variants below.  Growable containers use estimates of the
//! allocator's over-provisioning rather than the visible element count, so
//! the measured length may exceed `len()`.
//!
//! The estimate formulas are one reference policy copied from a particular
//! allocator's behavior; the constants live here so a port to a host with a
//! different growth curve only touches this file.

use crate::runtime::heap::ObjectHeap;
use crate::runtime::object::Object;

/// How to measure an instance's item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    /// The exact element or entry count.
    Exact,
    /// Growable-sequence slot estimate, including over-allocation.
    ListAlloc,
    /// Hash-map slot estimate; small maps live in the embedded table
    /// already counted by the base size.
    MapAlloc,
    /// Hash-set slot estimate, assuming the table is about half filled.
    SetAlloc,
    /// Character count plus the terminator.
    CharsPlusOne,
    /// Multi-precision integer digit count.
    Digits,
    /// Compiled code: stack plus variable slots.
    CodeSlots,
    /// Execution frame: the slot count of its code object.
    FrameSlots,
}

impl LengthRule {
    /// Measure an object under this rule.  Structurally unexpected payloads
    /// measure 0 rather than failing.
    pub fn measure(self, heap: &ObjectHeap, obj: &Object) -> usize {
        match self {
            LengthRule::Exact => obj.len().unwrap_or(0),
            LengthRule::ListAlloc => list_alloc(obj.len().unwrap_or(0)),
            LengthRule::MapAlloc => map_alloc(obj.len().unwrap_or(0)),
            LengthRule::SetAlloc => set_alloc(obj.len().unwrap_or(0)),
            LengthRule::CharsPlusOne => match obj {
                Object::Str(s) => s.chars().count() + 1,
                _ => 0,
            },
            LengthRule::Digits => match obj {
                Object::BigInt { digits } => *digits,
                _ => 0,
            },
            LengthRule::CodeSlots => match obj {
                Object::Code(code) => code_slots(code),
                _ => 0,
            },
            LengthRule::FrameSlots => match obj {
                Object::Frame { code, .. } => match heap.get(*code) {
                    Some(Object::Code(code)) => code_slots(code),
                    _ => 0,
                },
                _ => 0,
            },
        }
    }
}

/// Next power of two at or above `n`, starting from 16.
pub fn next_power_of_two_from_16(n: usize) -> usize {
    let mut p2 = 16;
    while n > p2 {
        p2 += p2;
    }
    p2
}

/// Allocated slots of a growable sequence holding `n` elements.
pub fn list_alloc(n: usize) -> usize {
    if n > 8 {
        n + 6 + (n >> 3)
    } else if n > 0 {
        n + 4
    } else {
        0
    }
}

/// Allocated entries of a hash map holding `n` entries.  Small maps fit the
/// embedded table accounted for in the base size, so they measure 0.
pub fn map_alloc(n: usize) -> usize {
    if n < 6 {
        0
    } else {
        next_power_of_two_from_16(n + 1)
    }
}

/// Allocated entries of a hash set holding `n` elements.
pub fn set_alloc(n: usize) -> usize {
    if n > 8 {
        next_power_of_two_from_16(n + n - 2)
    } else if n > 0 {
        8
    } else {
        0
    }
}

fn code_slots(code: &crate::runtime::object::CodeDef) -> usize {
    let slots = code.stack_slots + code.local_slots + code.free_slots + code.cell_slots;
    (slots as usize).saturating_sub(1)
}

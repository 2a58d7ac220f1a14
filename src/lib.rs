//! # Introduction
//!
//! heaplens computes the memory footprint of an arbitrary, possibly cyclic,
//! graph of live runtime objects: the combined size of one or more roots plus
//! everything they transitively reference, with configurable recursion depth,
//! alignment and inclusion rules.  Results can be browsed in a terminal UI
//! built with [ratatui](https://docs.rs/ratatui).
//!
//! ## Sizing pipeline
//!
//! ```text
//! ObjectHeap → Sizer → Registry ⇄ Classifier → Profiles → Report / Tracker / TUI
//! ```
//!
//! 1. [`runtime`] — the host object model: tagged [`runtime::object::Object`]
//!    payloads stored in an [`runtime::heap::ObjectHeap`], addressed by
//!    non-owning [`runtime::heap::ObjRef`] handles, plus the
//!    [`runtime::widths::PrimitiveWidths`] table for platform byte widths.
//! 2. [`engine`] — the sizing core: a [`engine::registry::Registry`] of
//!    per-type descriptors, the [`engine::classify`] rule chain for types
//!    seen for the first time, and the recursive
//!    [`engine::sizer::Sizer`] with identity-based cycle breaking.
//! 3. [`report`] — plain-text summary, profile and typedef tables.
//! 4. [`track`] — longitudinal tracking of named roots over time with a
//!    bounded snapshot history.
//! 5. [`ui`] — ratatui-based TUI; not part of the stable library API.
//!
//! ## Approximation
//!
//! Without an authoritative size oracle (see
//! [`runtime::heap::ObjectHeap::set_oracle`]) flat sizes are estimates built
//! from the primitive width table plus allocator over-provisioning
//! heuristics.  Sizing is single-threaded; one [`engine::sizer::Sizer`] must
//! not be shared across threads.

pub mod engine;
pub mod report;
pub mod runtime;
pub mod track;
pub mod ui;

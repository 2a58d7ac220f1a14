//! Sizing engine
//!
//! This module provides the core sizing logic:
//! - [`descriptor`]: per-type size/behavior metadata ([`descriptor::TypeKey`],
//!   [`descriptor::TypeDescriptor`], the closed referent-rule table)
//! - [`lengths`]: allocator over-provisioning estimates and the closed
//!   length-rule table
//! - [`registry`]: the type-descriptor registry with its static seed table
//! - [`classify`]: the priority-ordered rule chain for unseen types
//! - [`config`]: traversal configuration and validation
//! - [`sizer`]: the recursive traversal core and its session state
//! - [`profile`]: per-type statistics accumulated while sizing
//! - [`errors`]: engine error types
//!
//! # Threading
//!
//! A [`sizer::Sizer`] owns its registry and session state and mutates both
//! in place without synchronization; it is not safe for concurrent use.
//! Independent `Sizer`s (each with its own registry) are independent.

pub mod classify;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod lengths;
pub mod profile;
pub mod registry;
pub mod sizer;

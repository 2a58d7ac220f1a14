//! Host runtime object model
//!
//! This module provides the object graph the engine sizes:
//! - [`object`]: tagged runtime object representation (scalars, containers,
//!   namespaces, definitions, execution state)
//! - [`heap`]: the object store, handing out stable [`heap::ObjRef`]
//!   identities and hosting the optional precise-size oracle
//! - [`widths`]: primitive byte widths for the current platform and the
//!   composite header/entry sizes derived from them
//!
//! # Identity
//!
//! An [`heap::ObjRef`] is the address of one live object and is used by the
//! engine only for deduplication and cycle breaking, never for ownership.
//! The heap owns every object; references held elsewhere (profiles, trackers)
//! observe but never extend an object's lifetime.

pub mod heap;
pub mod object;
pub mod widths;

//! Stateless pane renderers
//!
//! Each pane is a free function taking a frame, an area and the data it
//! shows; all mutable UI state (focus, scroll offsets) lives in the app and
//! is passed in.

pub mod profile;
pub mod records;
pub mod status;
pub mod summary;

pub use profile::render_profile_pane;
pub use records::render_records_pane;
pub use status::render_status_bar;
pub use summary::render_summary_pane;

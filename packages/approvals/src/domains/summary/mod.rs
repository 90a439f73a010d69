//! Pending-approval summaries: persisted rows and list rendering.

pub mod actions;
pub mod models;

pub use actions::get_summary;

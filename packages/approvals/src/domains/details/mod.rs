//! Document details: persisted sections, LOB refresh, attachments.

pub mod actions;
pub mod models;

pub use actions::{get_attachment, get_details};

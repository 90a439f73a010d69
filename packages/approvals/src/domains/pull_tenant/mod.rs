//! Pull-model tenants: live summary, details and action pass-through.

pub mod actions;

pub use actions::{get_pull_details, get_pull_summary, submit_pull_action};

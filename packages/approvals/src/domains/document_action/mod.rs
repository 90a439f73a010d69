//! Document actions: validation, single and bulk pipelines, client action
//! shaping.

pub mod actions;
pub mod bulk;
pub mod client_actions;
pub mod models;
pub mod validation;

pub use actions::take_action;
pub use bulk::take_bulk_action;
pub use client_actions::{client_actions, ClientAction};

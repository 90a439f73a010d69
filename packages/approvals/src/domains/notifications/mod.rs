//! Notifications: templated action emails, optionally actionable.

pub mod actions;
pub mod adaptive_card;
pub mod models;
pub mod templates;

pub use actions::send_action_notification;

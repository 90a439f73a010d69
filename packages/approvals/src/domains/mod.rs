// Business domains
pub mod audit;
pub mod details;
pub mod document_action;
pub mod notifications;
pub mod pull_tenant;
pub mod summary;
pub mod tenant;

//! Audit trail: transaction history for every action attempt.

pub mod models;

//! Tenant configuration model.

pub mod models;

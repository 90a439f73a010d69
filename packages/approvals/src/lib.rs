// Approvals - business logic core
//
// This crate is the tenant-agnostic approval layer: pending-approval
// summaries, document actions (single and bulk), details, notifications and
// audit, all over injected infrastructure traits. Hosting (HTTP controllers,
// storage engines, delivery providers) lives upstream and plugs in through
// `kernel::ApprovalsDeps`.
//
// Entry points are the free async functions in domains/*/actions.

pub mod common;
pub mod domains;
pub mod kernel;

pub use kernel::{ApprovalsConfig, ApprovalsDeps};

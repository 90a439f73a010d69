//! Typed ID definitions for all domain entities.
//!
//! This module defines type aliases for each domain entity, providing
//! compile-time type safety for ID usage throughout the application.

// Re-export the core Id type and version markers
pub use super::id::{Id, V4, V7};

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Tenant entities (line-of-business systems).
pub struct Tenant;

/// Marker type for TransactionHistory entities (audit records).
pub struct TransactionHistory;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Tenant entities.
pub type TenantId = Id<Tenant>;

/// Typed ID for TransactionHistory entities.
pub type HistoryId = Id<TransactionHistory>;

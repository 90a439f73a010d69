pub mod entity_ids;
pub mod errors;
pub mod id;
pub mod types;

pub use entity_ids::{HistoryId, TenantId};
pub use errors::{ApprovalsError, ClientErrorInfo};
pub use types::{Alias, ClientDevice, DocumentNumber};

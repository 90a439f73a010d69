pub mod config;
pub mod deps;
pub mod tenant_client;
pub mod test_dependencies;
pub mod traits;

pub use config::ApprovalsConfig;
pub use deps::ApprovalsDeps;
pub use tenant_client::HttpTenantAdapter;
pub use traits::{
    BaseBlobStore, BaseDetailsStore, BaseFlightingService, BaseHistoryStore, BaseNameResolver,
    BaseNotificationSender, BaseSummaryStore, BaseTemplateStore, BaseTenantAdapter,
    BaseTenantStore,
};

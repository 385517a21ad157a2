pub mod filter_service;
pub mod grouping_service;
pub mod order_index;
pub mod project_service;
pub mod status_service;
pub mod workflow_service;

pub use grouping_service::GroupingService;
pub use project_service::ProjectService;
pub use workflow_service::WorkflowService;

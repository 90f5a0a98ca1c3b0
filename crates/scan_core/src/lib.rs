pub mod api;
pub mod classify;
pub mod decode;
pub mod session;
pub mod timeout;
pub mod workflow;

pub use api::{ApiClientError, DeliveryApi, HttpDeliveryApi, API_REQUEST_TIMEOUT};
pub use session::{BatchProgress, ScanSession};
pub use timeout::{TimeoutSupervisor, ASSIGNMENT_SCAN_TIMEOUT, CONFIRMATION_SCAN_TIMEOUT};
pub use workflow::{
    ModalContent, ScanWorkflow, WorkflowConfig, WorkflowEvent, WorkflowState,
    OFFICER_ROLE_PREFIXES,
};

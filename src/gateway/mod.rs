// API gateway: authentication gate in front of a path-prefix router.

pub mod router;
pub mod service_client;

pub use router::{route_request, GatewayState};
pub use service_client::ServiceClient;

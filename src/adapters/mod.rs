pub mod api_server;
pub mod smoke_client;

pub use api_server::{load_model, start_api_server};
pub use smoke_client::{sample_payload, SmokeClient, SmokeResult};

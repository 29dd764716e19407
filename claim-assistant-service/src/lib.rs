pub mod config;
pub mod service;
pub mod tasks;
pub mod workflow;

pub use config::{ConfigError, ServiceConfig};
pub use service::{AppState, build_router, create_app, create_app_state};
pub use workflow::{build_claim_graph, create_flow_runner};

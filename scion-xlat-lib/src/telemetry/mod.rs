pub mod health;
pub mod metrics;
pub mod metrics_handler;
pub mod server;
pub mod tracing;

pub use health::{live_check_body, ready_check_body};
pub use metrics::{init_metrics, Metrics};
pub use metrics_handler::render_metrics;
pub use server::start_observability_server;
pub use tracing::{init_tracing, shutdown_tracing};

mod loader;
mod logging;
mod root;
mod sciond;
mod tap;
mod telemetry;
mod translator;
mod validator;
mod xdp;

pub use loader::load_from_path;
pub use logging::LoggingConfig;
pub use root::Config;
pub use sciond::SciondConfig;
pub use tap::TapConfig;
pub use telemetry::TelemetryConfig;
pub use translator::TranslatorConfig;
pub use validator::validate;
pub use xdp::XdpConfig;

// CLASSIC - Crash Log Auto Scanner & Setup Integrity Checker
//
// This is the library crate containing the configuration cache and the
// game files diagnostic pipeline. The binary crate (main.rs) runs a scan
// from the console.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::{ConfigError, ConfigStore, DataLayout, StoreLocator};
pub use metrics::Metrics;
pub use models::{ClassicSettings, ConfigValue, DiagnosticMessage, GameVars, Severity, YamlStore};
pub use services::{DiagnosticError, Report, ReportAggregator};
pub use state::{ContextChange, ContextManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "CLASSIC";

//! Data models for CLASSIC.
//!
//! - [`ConfigValue`]: one node of a cached YAML document, with total coercion through [`FromConfigValue`]
//! - [`YamlStore`]: the logical stores served by [`ConfigStore`](crate::config::ConfigStore)
//! - [`GameVars`]: the active game and VR flag that store paths and key prefixes depend on
//! - [`DiagnosticMessage`]: one block of the final report, with a [`Severity`]
//! - [`ClassicSettings`]: typed view of `CLASSIC Settings.yaml`

pub mod config;
pub mod context;
pub mod message;
pub mod store;
pub mod value;

pub use config::{ClassicSettings, SettingsFile};
pub use context::GameVars;
pub use message::{DiagnosticMessage, SEPARATOR, Severity};
pub use store::YamlStore;
pub use value::{ConfigValue, FromConfigValue};

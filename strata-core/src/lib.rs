//! Configuration and logging shared by the Strata crates.

pub mod config;
pub mod logging;

pub use config::{
    ConfigError, ConfigProperties, ConfigValue, FromConfigValue, StrataConfig, StrataSettings,
};
pub use logging::init_tracing;

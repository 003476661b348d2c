//! A3S Build Core - Foundational Types
//!
//! Error type, YAML build configuration, registry credential encoding and
//! the config template shared by the a3s-build crates.

pub mod config;
pub mod error;
pub mod registry;
pub mod template;

// Re-export commonly used types
pub use config::{
    BuildOptions, BuildkitConfig, Config, ImageConfig, RegistryConfig, DEFAULT_CONFIG_FILE,
};
pub use error::{BuildError, Result};
pub use registry::encode_auth;
pub use template::render_template;

/// A3S Build version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

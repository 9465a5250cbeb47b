//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) and/or command line flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, derived fields)
//!     → DaemonConfig (validated, immutable)
//!     → handed to the daemon by value
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, BuildInfo, DaemonConfig};
pub use validation::{post_process, ValidationError};

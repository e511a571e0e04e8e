//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (API_PORT, API_USERNAME, ... env overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → passed by value to the HTTP server and the update worker
//! ```
//!
//! # Design Decisions
//! - Config is built once at startup; there is no global settings state
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_startup_config, ConfigError};
pub use schema::AppConfig;
pub use schema::AuthConfig;
pub use schema::ListenerConfig;
pub use schema::PgBouncerConfig;
pub use schema::ReloadConfig;
pub use validation::{validate_config, ValidationError};

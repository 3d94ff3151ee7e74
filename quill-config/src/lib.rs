//! Configuration for the Quill server.
//!
//! Values are layered from a `.env` file, an optional `quill.toml` and the
//! process environment (environment wins), then checked by
//! [`validation::apply_guard_rails`].

pub mod loader;
pub mod models;
/// Guard rails and non-fatal warnings.
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions,
    sources::{EnvConfig, FileConfig},
};
pub use models::{
    CompletionConfig, Config, ConfigMetadata, CorsConfig, ServerConfig,
};
pub use validation::{
    ConfigGuardRailError, ConfigWarning, ConfigWarnings, apply_guard_rails,
};

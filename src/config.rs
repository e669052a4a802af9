//! Workspace configuration.
/// Configuration file loading and the settings file location
mod manager;
/// Configuration types and settings
mod types;

pub use manager::ConfigManager;
pub use types::{
    ConfigError,
    CustomizeSettings,
    TranslationFilesConfig,
    ValidationError,
};

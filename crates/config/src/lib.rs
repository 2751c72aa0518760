//! Configuration: `shelfwise.toml` schema, loading and environment overrides.

pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, default_config_path, load, load_file, require_api_key},
    schema::{ProviderConfig, ShelfwiseConfig, ShopConfig, TaskOverride},
};

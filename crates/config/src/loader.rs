use std::path::{Path, PathBuf};

use {secrecy::Secret, tracing::debug};

use crate::{
    error::{Error, Result},
    schema::ShelfwiseConfig,
};

pub const CONFIG_FILE_NAME: &str = "shelfwise.toml";

/// Env vars consulted for the API key, in priority order.
pub const API_KEY_ENV_VARS: &[&str] = &["SHELFWISE_API_KEY", "GEMINI_API_KEY"];
pub const MODEL_ENV_VAR: &str = "SHELFWISE_MODEL";
pub const BASE_URL_ENV_VAR: &str = "SHELFWISE_BASE_URL";

/// Platform config path, e.g. `~/.config/shelfwise/shelfwise.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "shelfwise")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Parse a config file.
pub fn load_file(path: &Path) -> Result<ShelfwiseConfig> {
    let data = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&data).map_err(|source| Error::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration and apply environment overrides.
///
/// An explicit `path` must exist. Without one, the platform default is used
/// when present and built-in defaults otherwise.
pub fn load(path: Option<&Path>) -> Result<ShelfwiseConfig> {
    let mut config = match path {
        Some(p) => load_file(p)?,
        None => match default_config_path() {
            Some(p) if p.exists() => load_file(&p)?,
            _ => {
                debug!("no config file found, using defaults");
                ShelfwiseConfig::default()
            },
        },
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

/// Overlay values from the environment. `lookup` is injected so tests do not
/// mutate the process environment.
pub fn apply_env_overrides<F>(config: &mut ShelfwiseConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(key) = API_KEY_ENV_VARS.iter().find_map(|name| non_blank(*name)) {
        config.provider.api_key = Some(Secret::new(key));
    }
    if let Some(model) = non_blank(MODEL_ENV_VAR) {
        config.provider.model = model;
    }
    if let Some(url) = non_blank(BASE_URL_ENV_VAR) {
        config.provider.base_url = url;
    }
}

/// Startup validation: the service key must be present before the model
/// gateway is built.
pub fn require_api_key(config: &ShelfwiseConfig) -> Result<&Secret<String>> {
    config.provider.api_key().ok_or_else(|| {
        Error::Missing(format!(
            "provider.api_key (set it in {CONFIG_FILE_NAME} or export {})",
            API_KEY_ENV_VARS.join(" / ")
        ))
    })
}

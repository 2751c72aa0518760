//! Reading command inputs from disk.

use std::path::Path;

use {
    anyhow::{Context, Result, bail},
    serde::de::DeserializeOwned,
    shelfwise_common::InlineImage,
};

/// Load an image, taking the MIME type from the file extension.
pub fn read_image(path: &Path) -> Result<InlineImage> {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        bail!("{} has no file extension", path.display());
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    InlineImage::from_file_bytes(ext, &bytes)
        .with_context(|| format!("loading image {}", path.display()))
}

/// Load a JSON array of records (inventory, sales, customers).
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let data =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))
}

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

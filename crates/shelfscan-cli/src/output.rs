//! File writers for run results.
//!
//! Every writer creates missing parent directories and overwrites an
//! existing file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

/// `<out>/aldi/aldi_products_detailed.json`
pub(crate) fn catalog_path(output_dir: &Path) -> PathBuf {
    output_dir.join("aldi").join("aldi_products_detailed.json")
}

/// `<out>/walmart/walmart_store_<store>_products.<ext>`
pub(crate) fn store_path(output_dir: &Path, store_id: u32, ext: &str) -> PathBuf {
    output_dir
        .join("walmart")
        .join(format!("walmart_store_{store_id}_products.{ext}"))
}

/// `<out>/walmart/product_<id>.json`
pub(crate) fn product_path(output_dir: &Path, item_id: &str) -> PathBuf {
    output_dir
        .join("walmart")
        .join(format!("product_{item_id}.json"))
}

/// `<out>/walmart/next_data_<id>.json`
pub(crate) fn next_data_path(output_dir: &Path, item_id: &str) -> PathBuf {
    output_dir
        .join("walmart")
        .join(format!("next_data_{item_id}.json"))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

/// Writes `value` as pretty-printed JSON.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote JSON");
    Ok(())
}

/// Writes `rows` as CSV with a header row taken from the field names.
///
/// An empty slice produces an empty file.
pub(crate) fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote CSV");
    Ok(())
}

//! JSON output
//!
//! The harvest result is written once, at the end of a run, as a single
//! JSON array of article records. Non-ASCII text is kept as-is.

use crate::extract::ArticleRecord;
use crate::HarvestError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the collected articles to `path`
///
/// Missing parent directories are created. An existing file is replaced.
///
/// # Arguments
///
/// * `path` - Destination file
/// * `articles` - Records in arrival order
///
/// # Returns
///
/// * `Ok(())` - The array was written and flushed
/// * `Err(HarvestError)` - The file could not be created or written
pub fn write_articles(path: &Path, articles: &[ArticleRecord]) -> Result<(), HarvestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, articles)?;
    writer.flush()?;

    tracing::info!("Wrote {} articles to {}", articles.len(), path.display());
    Ok(())
}

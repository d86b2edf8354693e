//! Startup loading of directory entries from a JSON file.
//!
//! The file holds an array of centre patches in the same camelCase shape the API
//! serves. Entries are merged with [`MergePolicy::FillEmpty`], so reseeding never
//! overwrites data that was edited since.

use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{CentrePatch, MergePolicy},
    services::directory::DirectoryWriter,
};

pub fn parse_seed(json: &str) -> AppResult<Vec<CentrePatch>> {
    serde_json::from_str(json)
        .map_err(|e| AppError::InvalidInput(format!("Invalid seed file: {}", e)))
}

/// Upserts every centre in `patches`, returning how many were applied
pub async fn apply_seed(writer: &dyn DirectoryWriter, patches: Vec<CentrePatch>) -> AppResult<usize> {
    let count = patches.len();
    for patch in patches {
        writer.upsert_centre(patch, MergePolicy::FillEmpty).await?;
    }
    tracing::info!(centres = count, "Directory seeded");
    Ok(count)
}

pub async fn seed_from_file(writer: &dyn DirectoryWriter, path: &Path) -> AppResult<usize> {
    let json = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Internal(format!("Failed to read seed file {}: {}", path.display(), e))
    })?;
    apply_seed(writer, parse_seed(&json)?).await
}

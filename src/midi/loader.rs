//! Corpus loading from a dataset directory.

use super::{import_from_midi, Score};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads every score under `dir`.
///
/// `.mid`/`.midi` files go through the MIDI importer and `.json` files are
/// read as serialized [`Score`]s. Paths are visited in sorted order so the
/// resulting corpus is reproducible. Files that fail to load are logged and
/// skipped.
///
/// # Errors
///
/// Returns error only if the directory itself cannot be walked
pub fn load_scores<P: AsRef<Path>>(dir: P) -> std::io::Result<Vec<Score>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }

    let mut scores = Vec::with_capacity(paths.len());
    for path in paths {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let loaded = match extension.as_deref() {
            Some("mid") | Some("midi") => import_from_midi(&path).map_err(|e| e.to_string()),
            Some("json") => Score::load_from_file(&path).map_err(|e| e.to_string()),
            _ => {
                tracing::debug!("Skipping non-score file {:?}", path);
                continue;
            }
        };

        match loaded {
            Ok(score) => scores.push(score),
            Err(e) => tracing::warn!("Failed to load score {:?}: {}", path, e),
        }
    }

    tracing::info!("Loaded {} scores from {:?}", scores.len(), dir.as_ref());
    Ok(scores)
}

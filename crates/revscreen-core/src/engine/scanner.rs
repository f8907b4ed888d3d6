use super::error::EngineError;
use crate::core::io::model_file::MODEL_FILE_EXTENSION;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Result of scanning a model database. `Empty` is fatal for a screening run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Models(Vec<PathBuf>),
    Empty,
}

impl ScanOutcome {
    pub fn into_models(self) -> Option<Vec<PathBuf>> {
        match self {
            ScanOutcome::Models(models) => Some(models),
            ScanOutcome::Empty => None,
        }
    }
}

/// Recursively collects every `.pm` file under `root`, sorted by path.
///
/// Symlinked directories are not followed. Unreadable subdirectories are skipped
/// with a warning; an unreadable root is an error.
#[instrument(skip_all, name = "scan_models", fields(root = %root.display()))]
pub fn scan_models(root: &Path) -> Result<ScanOutcome, EngineError> {
    if !root.is_dir() {
        return Err(EngineError::DatabaseNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let mut dirs_to_visit = vec![root.to_path_buf()];

    while let Some(dir) = dirs_to_visit.pop() {
        let entries = match dir.read_dir() {
            Ok(entries) => entries,
            Err(source) if dir == root => {
                return Err(EngineError::Io { path: dir, source });
            }
            Err(e) => {
                warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            let Ok(ty) = entry.file_type() else {
                continue;
            };

            if ty.is_dir() {
                dirs_to_visit.push(path);
                continue;
            }

            let is_file = ty.is_file() || (ty.is_symlink() && path.is_file());
            if is_file && has_model_extension(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    debug!("Scan finished with {} model file(s).", files.len());

    if files.is_empty() {
        return Ok(ScanOutcome::Empty);
    }
    info!("Found {} pharmacophore models in {}", files.len(), root.display());
    Ok(ScanOutcome::Models(files))
}

fn has_model_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(MODEL_FILE_EXTENSION))
}

//! Turning command-line paths into batch input files.

use anyhow::Context;
use rayon::prelude::*;
use snapimg_batch::InputFile;
use snapimg_image::sniff_media_type;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Media type given to files nothing could identify
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Expand `paths` into a flat file list.
///
/// Files are kept in argument order; directories are walked recursively in
/// name order, skipping hidden entries.
pub fn collect_paths(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let walker = WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));
            for entry in walker {
                let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            anyhow::bail!("No such file or directory: {}", path.display());
        }
    }

    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Media type for a file: from its extension, then from its content.
pub fn media_type_for(path: &Path, data: &[u8]) -> String {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    mime_guess::from_path(path)
        .first_raw()
        .filter(|mime| mime.starts_with("image/"))
        .or_else(|| sniff_media_type(name, data))
        .or_else(|| mime_guess::from_path(path).first_raw())
        .unwrap_or(UNKNOWN_MEDIA_TYPE)
        .to_string()
}

/// Read every file in parallel, keeping the order of `paths`.
pub fn load_files(paths: &[PathBuf]) -> anyhow::Result<Vec<InputFile>> {
    paths
        .par_iter()
        .map(|path| -> anyhow::Result<InputFile> {
            let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let media_type = media_type_for(path, &data);
            debug!(name = %name, media_type = %media_type, bytes = data.len(), "Loaded file");
            Ok(InputFile::new(name, media_type, data))
        })
        .collect()
}

//! `savePdf`/`deleteIfDifferent` (spec.md §4.5).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;
use weeklybin_model::MediaType;

use crate::error::Result;
use crate::filename::{build_base_name, finalize_pdf_filename};
use crate::pdf_meta::{embed_metadata, producer_marker};
use crate::week::bin_path;

pub struct SaveOptions<'a> {
    pub bookmarked_at: Option<DateTime<Utc>>,
    pub title: Option<&'a str>,
    pub media_type: MediaType,
    pub is_social_status: bool,
    pub direct_article: bool,
}

pub struct WeeklyBinStore {
    data_dir: PathBuf,
}

impl WeeklyBinStore {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Embeds metadata, derives the weekly-bin path, builds and sanitizes
    /// the filename, and writes the file. Returns the absolute path.
    pub fn save_pdf(&self, bytes: &[u8], original_url: &str, opts: SaveOptions<'_>) -> Result<PathBuf> {
        let captured_at = opts.bookmarked_at.unwrap_or_else(Utc::now);
        let producer = producer_marker(Utc::now());
        let with_metadata = embed_metadata(bytes, original_url, &producer)?;

        let dir = bin_path(&self.data_dir, captured_at, opts.media_type);
        std::fs::create_dir_all(&dir)?;

        let base = build_base_name(
            original_url,
            opts.title,
            opts.is_social_status,
            opts.direct_article,
        );
        let filename = finalize_pdf_filename(&base);
        let path = dir.join(filename);

        std::fs::write(&path, with_metadata)?;

        path.canonicalize().map_err(Into::into)
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Deletes `old_path` only when it differs from `new_path` after both are
/// resolved absolutely. ENOENT is not an error; permission errors are
/// logged and swallowed (spec.md §4.5, and the `oldFilePath` invariant in
/// §3: never delete before the new save has already succeeded).
pub fn delete_if_different(old_path: &Path, new_path: &Path) {
    let old_resolved = old_path.canonicalize();
    let new_resolved = new_path.canonicalize();

    if let (Ok(old), Ok(new)) = (&old_resolved, &new_resolved) {
        if old == new {
            return;
        }
    }

    match std::fs::remove_file(old_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %old_path.display(), error = %e, "failed to remove stale bin file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_if_different_is_noop_when_paths_match() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"hello").unwrap();
        delete_if_different(&path, &path);
        assert!(path.exists());
    }

    #[test]
    fn delete_if_different_removes_old_when_paths_differ() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("a.pdf");
        let new = dir.path().join("b.pdf");
        std::fs::write(&old, b"old").unwrap();
        std::fs::write(&new, b"new").unwrap();
        delete_if_different(&old, &new);
        assert!(!old.exists());
        assert!(new.exists());
    }

    #[test]
    fn delete_if_different_tolerates_missing_old_path() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("missing.pdf");
        let new = dir.path().join("b.pdf");
        std::fs::write(&new, b"new").unwrap();
        delete_if_different(&old, &new); // must not panic
    }
}

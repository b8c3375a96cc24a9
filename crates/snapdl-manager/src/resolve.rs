//! Locating, moving and cleaning up downloaded files.

use crate::{ManagerError, Result};
use snapdl_types::OUTPUT_EXT_PLACEHOLDER;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions probed for a finished download, in priority order.
pub const CANDIDATE_EXTENSIONS: [&str; 5] = ["mp4", "mkv", "webm", "mp3", "m4a"];

/// Finds the file produced for an output template.
///
/// Strips the `.%(ext)s` placeholder from `template` and returns the first
/// existing file among [`CANDIDATE_EXTENSIONS`]. Any other extension counts
/// as not found.
#[must_use]
pub fn resolve_output(template: &Path) -> Option<PathBuf> {
    let stem = template_stem(template)?;
    let dir = template.parent().unwrap_or_else(|| Path::new(""));

    CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// Returns the template's file name with the placeholder suffix removed.
fn template_stem(template: &Path) -> Option<String> {
    let name = template.file_name()?.to_string_lossy().into_owned();
    let suffix = format!(".{OUTPUT_EXT_PLACEHOLDER}");
    Some(name.strip_suffix(&suffix).map_or(name.clone(), str::to_string))
}

/// Moves `file` into `dir`, keeping its name.
///
/// Falls back to copy and delete when a rename is not possible, e.g. across
/// filesystems.
pub(crate) fn relocate(file: &Path, dir: &Path) -> Result<PathBuf> {
    let Some(name) = file.file_name() else {
        return Ok(file.to_path_buf());
    };
    let target = dir.join(name);
    if target == file {
        return Ok(target);
    }

    let to_err = |source| ManagerError::Relocate {
        from: file.to_path_buf(),
        to: target.clone(),
        source,
    };

    if fs::rename(file, &target).is_err() {
        fs::copy(file, &target).map_err(to_err)?;
        fs::remove_file(file).map_err(to_err)?;
    }
    Ok(target)
}

/// Deletes every file in `dir` whose name starts with `<stem>.`.
///
/// Failures are logged and skipped. Returns how many files were deleted.
pub(crate) fn remove_partials(dir: &Path, stem: &str) -> usize {
    let prefix = format!("{stem}.");
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot scan for partial files");
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let matches = entry.file_name().to_string_lossy().starts_with(&prefix);
        if !matches || !path.is_file() {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "removed partial file");
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove partial file");
            }
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn template_in(dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{stem}.{OUTPUT_EXT_PLACEHOLDER}"))
    }

    #[test]
    fn test_resolves_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let produced = temp_dir.path().join("title.mp4");
        fs::write(&produced, b"media").unwrap();

        let template = template_in(temp_dir.path(), "title");
        assert_eq!(resolve_output(&template), Some(produced));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let template = template_in(temp_dir.path(), "title");
        assert_eq!(resolve_output(&template), None);
    }

    #[test]
    fn test_unexpected_extension_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("title.opus"), b"audio").unwrap();
        fs::write(temp_dir.path().join("title.mp4.part"), b"partial").unwrap();

        let template = template_in(temp_dir.path(), "title");
        assert_eq!(resolve_output(&template), None);
    }

    #[test]
    fn test_container_formats_take_priority() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("title.m4a"), b"audio").unwrap();
        fs::write(temp_dir.path().join("title.webm"), b"video").unwrap();

        let template = template_in(temp_dir.path(), "title");
        assert_eq!(
            resolve_output(&template),
            Some(temp_dir.path().join("title.webm"))
        );
    }

    #[test]
    fn test_directory_with_candidate_name_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("title.mp4")).unwrap();
        fs::write(temp_dir.path().join("title.mp3"), b"audio").unwrap();

        let template = template_in(temp_dir.path(), "title");
        assert_eq!(
            resolve_output(&template),
            Some(temp_dir.path().join("title.mp3"))
        );
    }

    #[test]
    fn test_relocate_moves_file() {
        let temp_dir = TempDir::new().unwrap();
        let source_dir = temp_dir.path().join("cache");
        let final_dir = temp_dir.path().join("downloads");
        fs::create_dir_all(&source_dir).unwrap();
        fs::create_dir_all(&final_dir).unwrap();
        let file = source_dir.join("clip.mp4");
        fs::write(&file, b"media").unwrap();

        let moved = relocate(&file, &final_dir).unwrap();
        assert_eq!(moved, final_dir.join("clip.mp4"));
        assert!(moved.is_file());
        assert!(!file.exists());
    }

    #[test]
    fn test_relocate_into_same_dir_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("clip.mp4");
        fs::write(&file, b"media").unwrap();

        assert_eq!(relocate(&file, temp_dir.path()).unwrap(), file);
        assert!(file.is_file());
    }

    #[test]
    fn test_remove_partials_matches_stem_prefix() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["clip.mp4.part", "clip.f137.mp4", "clip.mp4", "clips.mp4", "other.mp4"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }

        assert_eq!(remove_partials(temp_dir.path(), "clip"), 3);
        assert!(temp_dir.path().join("clips.mp4").exists());
        assert!(temp_dir.path().join("other.mp4").exists());
        assert!(!temp_dir.path().join("clip.mp4.part").exists());
    }

    #[test]
    fn test_remove_partials_in_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(remove_partials(&temp_dir.path().join("gone"), "clip"), 0);
    }
}

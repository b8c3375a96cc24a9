//! Thumbnail command implementation.

use anyhow::{Context, Result, bail};
use snapdl_lib::prelude::*;
use std::path::{Path, PathBuf};

/// Generate a thumbnail for a local video file.
pub(crate) fn thumbnail(
    config: &ManagerConfig,
    ffmpeg: &Path,
    video: &Path,
    thumb_dir: Option<PathBuf>,
) -> Result<()> {
    if !video.is_file() {
        bail!("Video not found: {}", video.display());
    }

    let thumb_dir = thumb_dir
        .or_else(|| video.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&thumb_dir)
        .with_context(|| format!("Failed to create {}", thumb_dir.display()))?;

    let generator = ThumbnailGenerator::detect(ffmpeg, &config.base_dir, thumb_dir)
        .context("ffmpeg is required to generate thumbnails")?;

    match generator
        .generate(video, None)
        .context("Failed to run ffmpeg")?
    {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => bail!("ffmpeg produced no thumbnail for {}", video.display()),
    }
}

//! Still-frame thumbnails through `ffmpeg`.

use crate::locate::version_with_flag;
use crate::{ProcessError, Result, ToolCommand, locate_tool};
use std::ffi::OsStr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::thread::{self, JoinHandle};

/// Offset of the frame grabbed for a thumbnail.
const THUMBNAIL_OFFSET: &str = "00:00:01";

/// Thin wrapper around the `ffmpeg` binary for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailGenerator {
    ffmpeg: PathBuf,
    output_dir: PathBuf,
}

impl ThumbnailGenerator {
    /// Creates a generator for a known `ffmpeg` and default output directory.
    #[must_use]
    pub const fn new(ffmpeg: PathBuf, output_dir: PathBuf) -> Self {
        Self { ffmpeg, output_dir }
    }

    /// Locates `ffmpeg` (see [`locate_tool`]) and checks that it runs.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::ToolNotFound`] if `ffmpeg` cannot be found or
    /// does not answer `-version`.
    pub fn detect(ffmpeg: &Path, base_dir: &Path, output_dir: PathBuf) -> Result<Self> {
        let ffmpeg = locate_tool(ffmpeg, base_dir)?;
        if version_with_flag(&ffmpeg, "-version").is_none() {
            return Err(ProcessError::ToolNotFound {
                tool: ffmpeg.display().to_string(),
                searched: "ffmpeg -version failed".to_string(),
            });
        }
        Ok(Self::new(ffmpeg, output_dir))
    }

    /// Returns the `ffmpeg` program path.
    #[must_use]
    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    /// Returns the first line of `ffmpeg -version`.
    #[must_use]
    pub fn version(&self) -> Option<String> {
        version_with_flag(&self.ffmpeg, "-version")
    }

    /// Runs `ffmpeg` with `args`, capturing its output.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::Spawn`] if `ffmpeg` cannot be started.
    pub fn run<I, S>(&self, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        ToolCommand::new(&self.ffmpeg).args(args).output()
    }

    /// Returns where the thumbnail for `video` is written inside `output_dir`.
    #[must_use]
    pub fn thumbnail_path(video: &Path, output_dir: &Path) -> PathBuf {
        let name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        output_dir.join(format!("thumb_{name}.jpg"))
    }

    /// Grabs one frame of `video` into a JPEG.
    ///
    /// Returns `Ok(None)` if the video does not exist or `ffmpeg` produced no
    /// file.
    ///
    /// # Errors
    ///
    /// Returns an error if `ffmpeg` cannot be started.
    pub fn generate(&self, video: &Path, output_dir: Option<&Path>) -> Result<Option<PathBuf>> {
        if !video.exists() {
            return Ok(None);
        }
        let output_dir = output_dir.unwrap_or(&self.output_dir);
        let thumb = Self::thumbnail_path(video, output_dir);

        let output = self.run([
            OsStr::new("-y"),
            OsStr::new("-i"),
            video.as_os_str(),
            OsStr::new("-ss"),
            OsStr::new(THUMBNAIL_OFFSET),
            OsStr::new("-vframes"),
            OsStr::new("1"),
            thumb.as_os_str(),
        ])?;

        if !output.status.success() {
            tracing::debug!(
                video = %video.display(),
                code = ?output.status.code(),
                "ffmpeg reported failure while generating thumbnail"
            );
        }

        Ok(thumb.exists().then_some(thumb))
    }

    /// Runs [`generate`](Self::generate) on a background thread and passes
    /// the result to `callback`.
    ///
    /// Failures reach the callback as `None`. A panicking callback is
    /// contained in the background thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn generate_async<F>(&self, video: PathBuf, callback: F) -> std::io::Result<JoinHandle<()>>
    where
        F: FnOnce(Option<PathBuf>) + Send + 'static,
    {
        let generator = self.clone();
        thread::Builder::new()
            .name("snapdl-thumbnail".to_string())
            .spawn(move || {
                let thumb = generator.generate(&video, None).unwrap_or_else(|e| {
                    tracing::warn!(video = %video.display(), error = %e, "thumbnail generation failed");
                    None
                });
                if catch_unwind(AssertUnwindSafe(|| callback(thumb))).is_err() {
                    tracing::warn!("thumbnail callback panicked");
                }
            })
    }
}

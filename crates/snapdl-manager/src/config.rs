//! Manager configuration.

use crate::{ManagerError, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use snapdl_process::locate_tool;
use std::path::{Path, PathBuf};

/// Tool name looked up when no explicit `yt-dlp` path is configured.
pub const DEFAULT_YTDLP: &str = "yt-dlp";

/// Name of the directory created inside the user's downloads folder.
pub const DEFAULT_DIR_NAME: &str = "SnapDL";

/// Whether finished files are moved from the temp directory into the
/// download directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelocatePolicy {
    /// Move the file only if the tool could not have written to the
    /// download directory itself.
    #[default]
    WhenUnwritable,
    /// Move the file whenever the two directories differ.
    Always,
    /// Leave the file where the tool wrote it.
    Never,
}

impl RelocatePolicy {
    /// Returns true if a file finished in `temp_dir` must be moved to
    /// `final_dir`.
    ///
    /// With [`WhenUnwritable`](Self::WhenUnwritable) this touches the file
    /// system to test whether `final_dir` accepts new files.
    #[must_use]
    pub fn applies(self, temp_dir: &Path, final_dir: &Path) -> bool {
        if temp_dir == final_dir {
            return false;
        }
        match self {
            Self::WhenUnwritable => !is_writable(final_dir),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Returns true if a file can be created in `dir`.
fn is_writable(dir: &Path) -> bool {
    tempfile::NamedTempFile::new_in(dir).is_ok()
}

/// Configuration for a [`DownloadManager`](crate::DownloadManager).
///
/// Missing fields in a config file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// The `yt-dlp` program: a bare name looked up on `PATH` and in the
    /// bundled binaries, or an explicit path.
    pub ytdlp: PathBuf,
    /// Application directory holding the bundled `binaries/` folder.
    pub base_dir: PathBuf,
    /// Directory finished downloads settle in.
    pub download_dir: PathBuf,
    /// Directory the tool writes into. Defaults to `download_dir`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    /// Whether finished files are moved from `temp_dir` to `download_dir`.
    pub relocate: RelocatePolicy,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            ytdlp: PathBuf::from(DEFAULT_YTDLP),
            base_dir: Self::default_base_dir(),
            download_dir: Self::default_download_dir(),
            temp_dir: None,
            relocate: RelocatePolicy::default(),
        }
    }
}

impl ManagerConfig {
    /// Returns the default download directory.
    ///
    /// This is `SnapDL` inside the platform's downloads folder, falling back
    /// to `~/Downloads/SnapDL` and finally to `./SnapDL`.
    #[must_use]
    pub fn default_download_dir() -> PathBuf {
        UserDirs::new().map_or_else(
            || PathBuf::from(DEFAULT_DIR_NAME),
            |dirs| {
                dirs.download_dir().map_or_else(
                    || dirs.home_dir().join("Downloads").join(DEFAULT_DIR_NAME),
                    |downloads| downloads.join(DEFAULT_DIR_NAME),
                )
            },
        )
    }

    /// Returns the directory of the running executable, or `.`.
    #[must_use]
    pub fn default_base_dir() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ManagerError::ReadConfig {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&text).map_err(|e| ManagerError::ParseConfig {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Builds the default configuration for an application installed in
    /// `base_dir`, resolving `yt-dlp` to a concrete program.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Tool`] if `yt-dlp` cannot be found.
    pub fn detect(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self {
            base_dir: base_dir.into(),
            ..Self::default()
        };
        config.ytdlp = locate_tool(&config.ytdlp, &config.base_dir)?;
        Ok(config)
    }

    /// Sets the `yt-dlp` program.
    #[must_use]
    pub fn with_ytdlp(mut self, ytdlp: impl Into<PathBuf>) -> Self {
        self.ytdlp = ytdlp.into();
        self
    }

    /// Sets the application base directory.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    /// Sets the download directory.
    #[must_use]
    pub fn with_download_dir(mut self, download_dir: impl Into<PathBuf>) -> Self {
        self.download_dir = download_dir.into();
        self
    }

    /// Sets a temp directory distinct from the download directory.
    #[must_use]
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    /// Sets the relocation policy.
    #[must_use]
    pub const fn with_relocate(mut self, relocate: RelocatePolicy) -> Self {
        self.relocate = relocate;
        self
    }

    /// Returns the directory the tool writes into.
    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.as_deref().unwrap_or(&self.download_dir)
    }
}

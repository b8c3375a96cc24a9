//! Locating external tools.

use crate::{ProcessError, Result, ToolCommand};
use std::path::{Path, PathBuf};

/// Subdirectory of the application base directory holding bundled tools.
pub const BINARIES_SUBDIR: &str = "binaries";

/// Resolves `tool` to a runnable program.
///
/// A path with more than one component must point at an existing file. A bare
/// name is looked up on `PATH` and accepted if `<tool> --version` succeeds;
/// otherwise `<base_dir>/binaries/<tool>` is used if present, after making it
/// executable.
///
/// # Errors
///
/// Returns [`ProcessError::ToolNotFound`] listing every location tried.
pub fn locate_tool(tool: &Path, base_dir: &Path) -> Result<PathBuf> {
    let name = tool.display().to_string();

    if tool.components().count() > 1 {
        if tool.is_file() {
            return Ok(tool.to_path_buf());
        }
        return Err(ProcessError::ToolNotFound {
            tool: name.clone(),
            searched: name,
        });
    }

    let mut searched = Vec::new();

    match which::which(tool) {
        Ok(found) => {
            if tool_version(&found).is_some() {
                tracing::debug!(tool = %name, path = %found.display(), "found tool on PATH");
                return Ok(found);
            }
            tracing::debug!(tool = %name, path = %found.display(), "tool on PATH failed --version");
            searched.push(found.display().to_string());
        }
        Err(_) => searched.push("PATH".to_string()),
    }

    let bundled = bundled_path(tool, base_dir);
    if bundled.is_file() {
        make_executable(&bundled)?;
        tracing::debug!(tool = %name, path = %bundled.display(), "using bundled tool");
        return Ok(bundled);
    }
    searched.push(bundled.display().to_string());

    Err(ProcessError::ToolNotFound {
        tool: name,
        searched: searched.join(", "),
    })
}

/// Returns the first line of `<program> --version`, or `None` if the tool
/// cannot be run or reports failure.
#[must_use]
pub fn tool_version(program: &Path) -> Option<String> {
    version_with_flag(program, "--version")
}

pub(crate) fn version_with_flag(program: &Path, flag: &str) -> Option<String> {
    let output = match ToolCommand::new(program).arg(flag).checked_output() {
        Ok(output) => output,
        Err(e) => {
            tracing::trace!(program = %program.display(), error = %e, "version probe failed");
            return None;
        }
    };
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().unwrap_or("").trim().to_string();
    Some(first)
}

fn bundled_path(tool: &Path, base_dir: &Path) -> PathBuf {
    let mut path = base_dir.join(BINARIES_SUBDIR).join(tool);
    if cfg!(windows) && path.extension().is_none() {
        path.set_extension("exe");
    }
    path
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    if permissions.mode() & 0o111 != 0o111 {
        permissions.set_mode(0o755);
        std::fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

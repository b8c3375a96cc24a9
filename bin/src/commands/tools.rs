//! Tools command implementation.

use anyhow::{Result, bail};
use snapdl_lib::prelude::*;
use snapdl_lib::tool_version;
use std::path::Path;

/// Print where the external tools were found and their versions.
pub(crate) fn tools(config: &ManagerConfig, ffmpeg: &Path) -> Result<()> {
    let mut missing = Vec::new();

    match locate_tool(&config.ytdlp, &config.base_dir) {
        Ok(path) => print_tool("yt-dlp", &path, tool_version(&path)),
        Err(e) => {
            println!("{:<8} {e}", "yt-dlp");
            missing.push("yt-dlp");
        }
    }

    match ThumbnailGenerator::detect(ffmpeg, &config.base_dir, config.download_dir.clone()) {
        Ok(generator) => print_tool("ffmpeg", generator.ffmpeg(), generator.version()),
        Err(e) => {
            println!("{:<8} {e}", "ffmpeg");
            missing.push("ffmpeg");
        }
    }

    println!("{:<8} {}", "output", config.download_dir.display());
    if config.temp_dir() != config.download_dir {
        println!("{:<8} {}", "temp", config.temp_dir().display());
    }

    if !missing.is_empty() {
        bail!("Missing tools: {}", missing.join(", "));
    }
    Ok(())
}

fn print_tool(name: &str, path: &Path, version: Option<String>) {
    println!(
        "{:<8} {} ({})",
        name,
        path.display(),
        version.as_deref().unwrap_or("unknown version")
    );
}

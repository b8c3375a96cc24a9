//! snapdl CLI - download audio and video through yt-dlp.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use snapdl_lib::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use commands::download::DownloadOptions;

#[derive(Parser)]
#[command(name = "snapdl")]
#[command(about = "Download audio and video through yt-dlp", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// JSON config file for the download manager
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// yt-dlp program (name on PATH or explicit path)
    #[arg(long, global = true)]
    ytdlp: Option<PathBuf>,

    /// ffmpeg program (name on PATH or explicit path)
    #[arg(long, global = true, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// Directory finished downloads are saved to
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// Directory yt-dlp writes into before files are moved to the output directory
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download one or more videos
    Download {
        /// Video URLs
        urls: Vec<String>,

        /// Extract audio only (mp3)
        #[arg(short, long)]
        audio: bool,

        /// Title used for the file name (single URL only)
        #[arg(short, long)]
        title: Option<String>,

        /// Uploader recorded on the job (single URL only)
        #[arg(long)]
        uploader: Option<String>,

        /// Search results file (JSON) to pick videos from
        #[arg(long)]
        from_search: Option<PathBuf>,

        /// 1-based result numbers to download from --from-search
        #[arg(long, num_args = 1.., requires = "from_search")]
        pick: Vec<usize>,

        /// Keep partial files when interrupted
        #[arg(long)]
        keep_partial: bool,

        /// Print the final job records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Grab a still frame from a video
    Thumbnail {
        /// Video file
        video: PathBuf,

        /// Directory for the thumbnail. Defaults to the video's directory.
        #[arg(long)]
        thumb_dir: Option<PathBuf>,
    },

    /// Show where yt-dlp and ffmpeg were found
    Tools,
}

impl Cli {
    /// Builds the manager configuration: config file or defaults, then flags.
    fn manager_config(&self) -> Result<ManagerConfig> {
        let mut config = match &self.config {
            Some(path) => ManagerConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ManagerConfig::default(),
        };

        if let Some(ytdlp) = &self.ytdlp {
            config.ytdlp.clone_from(ytdlp);
        }
        if let Some(dir) = &self.output_dir {
            config.download_dir.clone_from(dir);
        }
        if let Some(dir) = &self.temp_dir {
            config.temp_dir = Some(dir.clone());
        }
        Ok(config)
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command.as_ref() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = cli.manager_config()?;

    match command {
        Commands::Download {
            urls,
            audio,
            title,
            uploader,
            from_search,
            pick,
            keep_partial,
            json,
        } => {
            let options = DownloadOptions {
                urls: urls.clone(),
                audio: *audio,
                title: title.clone(),
                uploader: uploader.clone(),
                from_search: from_search.clone(),
                pick: pick.clone(),
                keep_partial: *keep_partial,
                json: *json,
            };
            commands::download::download(config, options, cli.quiet).await
        }
        Commands::Thumbnail { video, thumb_dir } => {
            commands::thumbnail::thumbnail(&config, &cli.ffmpeg, video, thumb_dir.clone())
        }
        Commands::Tools => commands::tools::tools(&config, &cli.ffmpeg),
    }
}

//! Download command implementation.
//!
//! This module turns URLs or picked search results into download jobs and
//! follows them until each one completes, fails or is stopped.

use crate::display::{JobBars, default_title, print_summary};
use anyhow::{Context, Result, bail};
use snapdl_lib::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Options of the `download` command.
#[derive(Debug, Clone, Default)]
pub(crate) struct DownloadOptions {
    pub(crate) urls: Vec<String>,
    pub(crate) audio: bool,
    pub(crate) title: Option<String>,
    pub(crate) uploader: Option<String>,
    pub(crate) from_search: Option<PathBuf>,
    pub(crate) pick: Vec<usize>,
    pub(crate) keep_partial: bool,
    pub(crate) json: bool,
}

/// Download every requested video and wait for all of them.
pub(crate) async fn download(
    config: ManagerConfig,
    options: DownloadOptions,
    quiet: bool,
) -> Result<()> {
    let requests = build_requests(&options)?;
    if requests.is_empty() {
        bail!("Nothing to download: pass one or more URLs or --from-search");
    }

    let (observer, mut events) = ChannelObserver::channel();
    let manager =
        DownloadManager::new(config, observer).context("Failed to start the download manager")?;

    let mut bars = JobBars::new(quiet);
    let mut pending = HashSet::new();
    for request in requests {
        let title = request.title.clone();
        let id = manager
            .create_job(request)
            .with_context(|| format!("Failed to queue '{title}'"))?;
        bars.add(id, &title);
        pending.insert(id);
    }

    let mut interrupted = false;
    while !pending.is_empty() {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                bars.apply(&event);
                let job = event.job();
                if event.kind().is_terminal() || job.status.is_settled() {
                    pending.remove(&job.id);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                tracing::info!(jobs = pending.len(), "interrupted; stopping downloads");
                interrupted = true;
                for id in pending.drain() {
                    if !manager.stop(id, !options.keep_partial) {
                        // No tool attached yet; dropping the job stops its worker.
                        manager.remove(id);
                    }
                    bars.abandon(id, "stopped");
                }
            }
        }
    }

    let jobs = manager.list_jobs();
    if options.json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
    } else if !quiet {
        print_summary(&jobs);
    }

    if interrupted {
        bail!("Download interrupted");
    }
    let failed = jobs
        .iter()
        .filter(|job| job.status == JobStatus::Error)
        .count();
    if failed > 0 {
        bail!("{} out of {} downloads failed", failed, jobs.len());
    }

    Ok(())
}

/// Builds one request per URL and per picked search result.
fn build_requests(options: &DownloadOptions) -> Result<Vec<DownloadRequest>> {
    if options.urls.len() > 1 && (options.title.is_some() || options.uploader.is_some()) {
        bail!("--title and --uploader apply to a single URL");
    }

    let mut requests: Vec<DownloadRequest> = options
        .urls
        .iter()
        .map(|url| {
            let title = options
                .title
                .clone()
                .unwrap_or_else(|| default_title(url));
            DownloadRequest::new(url.as_str(), title)
                .with_uploader(options.uploader.clone().unwrap_or_default())
                .audio_only(options.audio)
        })
        .collect();

    if let Some(path) = &options.from_search {
        requests.extend(search_requests(path, &options.pick, options.audio)?);
    }

    Ok(requests)
}

/// Reads a search results file and turns the picked results into requests.
///
/// Picks are 1-based; without picks the first result is used.
fn search_requests(path: &Path, picks: &[usize], audio: bool) -> Result<Vec<DownloadRequest>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read search results {}", path.display()))?;
    let response = SearchResponse::from_json(&text)
        .with_context(|| format!("Invalid search results {}", path.display()))?;

    if !response.success {
        bail!(
            "Search for '{}' failed: {}",
            response.query,
            response.error.as_deref().unwrap_or("unknown error")
        );
    }

    let picks = if picks.is_empty() { &[1][..] } else { picks };
    picks
        .iter()
        .map(|&pick| -> Result<DownloadRequest> {
            let result = pick
                .checked_sub(1)
                .and_then(|index| response.pick(index))
                .with_context(|| {
                    format!(
                        "No search result #{pick} (the file has {})",
                        response.results.len()
                    )
                })?;
            Ok(DownloadRequest::from_search_result(result, audio))
        })
        .collect()
}

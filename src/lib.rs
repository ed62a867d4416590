//! Mirror a Spotify playlist to a folder of tagged MP3 files.
//!
//! Each playlist track is matched to a YouTube Music result, streamed,
//! transcoded with ffmpeg and tagged. Completed tracks are recorded in a
//! progress file so the next run picks up where this one stopped.

use indicatif::ProgressBar;
use log::info;
use std::path::PathBuf;

use crate::error::Result;
use crate::metadata::CoverSource;
use crate::model::Track;
use crate::pipeline::Pipeline;
use crate::progress::ProgressStore;
use crate::spotify::MetadataProvider;
use crate::transcode::Transcoder;
use crate::youtube::{MediaSource, SearchProvider};

pub mod config;
pub mod error;
pub mod matcher;
pub mod metadata;
pub mod model;
pub mod paths;
pub mod pipeline;
pub mod progress;
pub mod spotify;
pub mod transcode;
pub mod youtube;

pub use error::Error;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub playlist_id: String,
    /// Playlist folders are created under this directory.
    pub output_dir: PathBuf,
    pub progress_file: PathBuf,
}

/// The external services a run talks to.
pub struct Services<'a> {
    pub metadata: &'a dyn MetadataProvider,
    pub search: &'a dyn SearchProvider,
    pub media: &'a dyn MediaSource,
    pub transcoder: &'a dyn Transcoder,
    pub covers: &'a dyn CoverSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub playlist: String,
    pub downloaded: usize,
    /// Tracks skipped because an earlier run already completed them.
    pub already_done: usize,
}

/// The playlist's tracks that are not yet in `progress`, in playlist order.
pub fn work_list(tracks: &[Track], progress: &ProgressStore) -> Vec<Track> {
    tracks
        .iter()
        .filter(|track| !progress.contains(&track.uri))
        .cloned()
        .collect()
}

/// Downloads every track of the playlist that earlier runs have not finished.
///
/// Tracks are processed one at a time in playlist order. The first track
/// that cannot be matched or downloaded stops the run with its error;
/// tracks completed before it stay recorded.
pub async fn download_playlist(
    options: &DownloadOptions,
    services: &Services<'_>,
    progress_bar: &ProgressBar,
) -> Result<RunSummary> {
    let playlist = services.metadata.playlist(&options.playlist_id).await?;
    let mut progress = ProgressStore::load(&options.progress_file)?;

    let pending = work_list(&playlist.tracks, &progress);
    let already_done = playlist.tracks.len() - pending.len();
    info!(
        "{} of {} tracks left to download",
        pending.len(),
        playlist.tracks.len()
    );

    let pipeline = Pipeline {
        media: services.media,
        transcoder: services.transcoder,
        covers: services.covers,
    };

    progress_bar.set_length(pending.len() as u64);
    for track in &pending {
        let candidate = matcher::resolve(track, services.search).await?;
        let destination = paths::destination(&options.output_dir, &playlist.name, &track.name);
        pipeline
            .download_track(&candidate, &destination, track)
            .await?;
        progress.record_completion(&track.uri)?;
        progress_bar.inc(1);
        info!("Downloaded {}", destination.display());
    }
    progress_bar.finish();

    Ok(RunSummary {
        playlist: playlist.name,
        downloaded: pending.len(),
        already_done,
    })
}

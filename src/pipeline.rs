//! Download, transcode and tag a single resolved track.

use log::debug;
use std::path::Path;

use crate::error::Result;
use crate::metadata::{self, CoverSource};
use crate::model::{Candidate, Track};
use crate::transcode::Transcoder;
use crate::youtube::MediaSource;

/// The collaborators a track needs on its way to disk.
///
/// A failure at any step aborts the track. A partially written file is left
/// where it is; callers must not treat the track as complete.
pub struct Pipeline<'a> {
    pub media: &'a dyn MediaSource,
    pub transcoder: &'a dyn Transcoder,
    pub covers: &'a dyn CoverSource,
}

impl Pipeline<'_> {
    pub async fn download_track(
        &self,
        candidate: &Candidate,
        destination: &Path,
        track: &Track,
    ) -> Result<()> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let stream = self.media.open_audio(&candidate.id).await?;
        self.transcoder.transcode(stream, destination).await?;
        debug!("Transcoded {} to {}", candidate.id, destination.display());

        let cover = match &track.cover_url {
            Some(url) => Some(self.covers.fetch(url).await?),
            None => None,
        };
        metadata::write_tags(destination, track, cover)
    }
}

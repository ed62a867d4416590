use async_trait::async_trait;
use log::debug;
use rustypipe::client::RustyPipe;
use rustypipe::model::{MusicItem, TrackType};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_RANGE, RANGE};
use rustypipe::param::StreamFilter;

use crate::error::{Error, Result};
use crate::model::{Candidate, CandidateKind};

/// Free-text search returning candidates in the provider's rank order.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>>;
}

/// Opens the best audio-only stream for a candidate id.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn open_audio(&self, id: &str) -> Result<Box<dyn AudioStream>>;
}

/// A pull-based stream of encoded audio bytes.
#[async_trait]
pub trait AudioStream: Send {
    /// Returns `None` once the stream is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

/// YouTube Music search and stream resolution backed by rustypipe.
pub struct YoutubeMusic {
    rp: RustyPipe,
    http: reqwest::Client,
}

impl YoutubeMusic {
    pub fn new() -> Self {
        Self {
            rp: RustyPipe::new(),
            http: reqwest::Client::new(),
        }
    }
}

impl Default for YoutubeMusic {
    fn default() -> Self {
        Self::new()
    }
}

fn candidate_from_item(item: MusicItem) -> Option<Candidate> {
    let candidate = match item {
        MusicItem::Track(track) => {
            let kind = match track.track_type {
                TrackType::Track => CandidateKind::Song,
                TrackType::Video => CandidateKind::Video,
                _ => CandidateKind::Other,
            };
            Candidate::new(track.id, kind, track.name)
        }
        MusicItem::Album(album) => Candidate::new(album.id, CandidateKind::Other, album.name),
        MusicItem::Artist(artist) => Candidate::new(artist.id, CandidateKind::Other, artist.name),
        MusicItem::Playlist(playlist) => {
            Candidate::new(playlist.id, CandidateKind::Other, playlist.name)
        }
        _ => return None,
    };
    Some(candidate)
}

#[async_trait]
impl SearchProvider for YoutubeMusic {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>> {
        debug!("Searching YouTube Music for \"{query}\"");
        let result = self
            .rp
            .query()
            .music_search_main(query)
            .await
            .map_err(|e| Error::Search {
                query: query.to_string(),
                reason: e.to_string(),
            })?;

        Ok(result
            .items
            .items
            .into_iter()
            .filter_map(candidate_from_item)
            .collect())
    }
}

#[async_trait]
impl MediaSource for YoutubeMusic {
    async fn open_audio(&self, id: &str) -> Result<Box<dyn AudioStream>> {
        let download_error = |reason: String| Error::Download {
            id: id.to_string(),
            reason,
        };

        let player = self
            .rp
            .query()
            .player(id)
            .await
            .map_err(|e| download_error(e.to_string()))?;
        let stream = player
            .select_audio_stream(&StreamFilter::new())
            .ok_or_else(|| download_error("no audio stream available".to_string()))?;
        debug!("Opening audio stream for {id}");

        Ok(Box::new(HttpAudioStream::new(
            id,
            self.http.clone(),
            stream.url.clone(),
        )))
    }
}

/// Largest byte range requested at once. googlevideo throttles or rejects
/// long unranged downloads.
const RANGE_SIZE: u64 = 10_000_000;

/// Reads the total size out of a `Content-Range: bytes 0-999/12345` header.
fn content_range_total(value: &str) -> Option<u64> {
    value.rsplit('/').next()?.trim().parse().ok()
}

struct HttpAudioStream {
    id: String,
    http: reqwest::Client,
    url: String,
    offset: u64,
    total: Option<u64>,
    response: Option<reqwest::Response>,
    /// Set once the server answered without honouring the range.
    exhausted: bool,
}

impl HttpAudioStream {
    fn new(id: &str, http: reqwest::Client, url: String) -> Self {
        Self {
            id: id.to_string(),
            http,
            url,
            offset: 0,
            total: None,
            response: None,
            exhausted: false,
        }
    }

    fn error(&self, reason: String) -> Error {
        Error::Download {
            id: self.id.clone(),
            reason,
        }
    }

    /// Requests the next range; `None` when there is nothing left to fetch.
    async fn next_range(&mut self) -> Result<Option<reqwest::Response>> {
        if self.exhausted || self.total.is_some_and(|total| self.offset >= total) {
            return Ok(None);
        }

        let end = self.offset + RANGE_SIZE - 1;
        debug!("Fetching bytes {}-{} of {}", self.offset, end, self.id);
        let response = self
            .http
            .get(&self.url)
            .header(RANGE, format!("bytes={}-{}", self.offset, end))
            .send()
            .await
            .map_err(|e| self.error(e.to_string()))?;

        match response.status() {
            StatusCode::RANGE_NOT_SATISFIABLE => return Ok(None),
            StatusCode::PARTIAL_CONTENT => {
                self.total = response
                    .headers()
                    .get(CONTENT_RANGE)
                    .and_then(|value| value.to_str().ok())
                    .and_then(content_range_total);
                if self.total.is_none() {
                    self.exhausted = true;
                }
            }
            _ => self.exhausted = true,
        }

        let response = response
            .error_for_status()
            .map_err(|e| self.error(e.to_string()))?;
        Ok(Some(response))
    }
}

#[async_trait]
impl AudioStream for HttpAudioStream {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if let Some(response) = self.response.as_mut() {
                let chunk = response.chunk().await.map_err(|e| Error::Download {
                    id: self.id.clone(),
                    reason: e.to_string(),
                })?;
                match chunk {
                    Some(bytes) => {
                        self.offset += bytes.len() as u64;
                        return Ok(Some(bytes.to_vec()));
                    }
                    None => self.response = None,
                }
            }

            match self.next_range().await? {
                Some(response) => self.response = Some(response),
                None => return Ok(None),
            }
        }
    }
}

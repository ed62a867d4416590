//! The errors that can occur while downloading a playlist.

use thiserror::Error;

/// A type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The possible errors that can occur.
///
/// Every variant is fatal for the run: nothing is retried and the
/// orchestrator stops at the first one it sees.
#[derive(Debug, Error)]
pub enum Error {
    /// The client credentials grant against the metadata provider failed.
    #[error("Failed to authenticate with the metadata provider: {0}")]
    Auth(String),
    /// The playlist could not be fetched.
    #[error("Failed to fetch playlist {id}: {reason}")]
    PlaylistFetch { id: String, reason: String },
    /// No song or video candidate was found for a track.
    #[error("No songs found for track {0}")]
    NoMatch(String),
    /// The search provider returned an error.
    #[error("Search for \"{query}\" failed: {reason}")]
    Search { query: String, reason: String },
    /// The audio stream could not be opened or read.
    #[error("Failed to download audio for {id}: {reason}")]
    Download { id: String, reason: String },
    /// The transcoding process failed.
    #[error("Failed to transcode to {path}: {reason}")]
    Transcode { path: String, reason: String },
    /// Writing the tag block failed.
    #[error("Failed to write tags to {path}: {reason}")]
    TagWrite { path: String, reason: String },

    /// The configuration is missing or malformed.
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// An error occurred while interacting with the file system.
    #[error("An IO error occurred: {0}")]
    Io(#[from] std::io::Error),
    /// An error occurred while fetching over HTTP.
    #[error("An error occurred while fetching: {0}")]
    Http(#[from] reqwest::Error),
    /// An error occurred while parsing or writing JSON.
    #[error("An error occurred while parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
}

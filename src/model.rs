//! Plain data passed between the providers, the matcher and the pipeline.

/// One playlist entry as reported by the metadata provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Stable provider URI, e.g. `spotify:track:4uLU6hMCjMI75M1A2tKUQC`.
    pub uri: String,
    pub name: String,
    /// Ordered; the first entry is the primary artist.
    pub artists: Vec<String>,
    pub album: String,
    /// Cover art location, if the album has any images.
    pub cover_url: Option<String>,
}

impl Track {
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

/// A playlist snapshot taken at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    pub tracks: Vec<Track>,
}

/// How the search provider classified a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Song,
    Video,
    Other,
}

/// A search result that may correspond to a [`Track`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Identifier usable to open a media stream.
    pub id: String,
    pub kind: CandidateKind,
    pub name: String,
}

impl Candidate {
    pub fn new(id: impl Into<String>, kind: CandidateKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
        }
    }

    pub fn is_song(&self) -> bool {
        self.kind == CandidateKind::Song
    }

    /// Songs and videos can be downloaded; albums, artists and the like cannot.
    pub fn is_playable(&self) -> bool {
        matches!(self.kind, CandidateKind::Song | CandidateKind::Video)
    }
}

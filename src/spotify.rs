use async_trait::async_trait;
use log::{debug, info};
use spotify_rs::{ClientCredsClient, Token};
use spotify_rs::model::PlayableItem;

use crate::error::{Error, Result};
use crate::model::{Playlist, Track};

/// Source of playlist snapshots.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn playlist(&self, id: &str) -> Result<Playlist>;
}

/// Spotify Web API client authenticated with the client credentials flow.
pub struct SpotifyProvider {
    client: ClientCredsClient<Token>,
}

impl SpotifyProvider {
    pub async fn authenticate(client_id: &str, client_secret: &str) -> Result<Self> {
        let client = ClientCredsClient::authenticate(client_id, client_secret)
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;
        info!("Authenticated with Spotify");
        Ok(Self { client })
    }
}

fn track_from(track: spotify_rs::model::track::Track) -> Track {
    Track {
        uri: track.uri,
        name: track.name,
        artists: track.artists.into_iter().map(|artist| artist.name).collect(),
        album: track.album.name,
        cover_url: track.album.images.into_iter().next().map(|image| image.url),
    }
}

#[async_trait]
impl MetadataProvider for SpotifyProvider {
    async fn playlist(&self, id: &str) -> Result<Playlist> {
        let fetch_error = |reason: String| Error::PlaylistFetch {
            id: id.to_string(),
            reason,
        };

        let playlist = spotify_rs::playlist(id)
            .get(&self.client)
            .await
            .map_err(|e| fetch_error(e.to_string()))?;
        let name = playlist.name;
        let items = playlist
            .tracks
            .get_all(&self.client)
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let mut tracks = Vec::with_capacity(items.len());
        for item in items {
            match item.map(|item| item.track) {
                Some(PlayableItem::Track(track)) => tracks.push(track_from(track)),
                Some(PlayableItem::Episode(episode)) => {
                    debug!("Skipping podcast episode {}", episode.name)
                }
                None => debug!("Skipping unavailable playlist entry"),
            }
        }

        info!("Found {} tracks in {}!", tracks.len(), name);
        Ok(Playlist { name, tracks })
    }
}

use async_trait::async_trait;
use lofty::{
    config::WriteOptions,
    error::LoftyError,
    file::{AudioFile, TaggedFileExt},
    picture::{MimeType, Picture, PictureType},
    read_from_path,
    tag::{Accessor, Tag},
};
use log::debug;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::Track;

/// Fetches cover art bytes.
#[async_trait]
pub trait CoverSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Default)]
pub struct HttpCoverSource {
    http: reqwest::Client,
}

impl HttpCoverSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CoverSource for HttpCoverSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn detect_image_mime_type(bytes: &[u8]) -> MimeType {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return MimeType::Png;
    }

    MimeType::Jpeg
}

/// Writes title, primary artist, album and front cover into the file's
/// primary tag, creating the tag if the file has none.
pub fn write_tags(path: &Path, track: &Track, cover: Option<Vec<u8>>) -> Result<()> {
    let tag_error = |e: LoftyError| Error::TagWrite {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut tagged_file = read_from_path(path).map_err(tag_error)?;

    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        debug!("No tags found in {}, creating a new `{tag_type:?}` tag", path.display());
        tagged_file.insert_tag(Tag::new(tag_type));
    }

    let tag = tagged_file
        .primary_tag_mut()
        .ok_or_else(|| Error::TagWrite {
            path: path.display().to_string(),
            reason: "file has no primary tag".to_string(),
        })?;

    tag.set_title(track.name.clone());
    if let Some(artist) = track.primary_artist() {
        tag.set_artist(artist.to_string());
    }
    tag.set_album(track.album.clone());

    if let Some(image_bytes) = cover {
        let mime_type = detect_image_mime_type(&image_bytes);
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(mime_type),
            Some("Cover".to_string()),
            image_bytes,
        ));
    }

    let write_options = WriteOptions::new()
        .use_id3v23(true)
        .remove_others(false)
        .respect_read_only(false);

    tagged_file
        .save_to_path(path, write_options)
        .map_err(tag_error)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    /// A run of silent MPEG-1 Layer III frames (128kbps, 44.1kHz, stereo).
    pub(crate) fn silent_mp3(frames: usize) -> Vec<u8> {
        let mut frame = [0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        frame.repeat(frames)
    }

    fn track() -> Track {
        Track {
            uri: "spotify:track:1".to_string(),
            name: "Song A".to_string(),
            artists: vec!["Artist X".to_string(), "Artist Y".to_string()],
            album: "Album Z".to_string(),
            cover_url: None,
        }
    }

    #[test]
    fn detects_png_and_defaults_to_jpeg() {
        assert_eq!(
            detect_image_mime_type(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            MimeType::Png
        );
        assert_eq!(detect_image_mime_type(&[0xFF, 0xD8, 0xFF, 0xE0]), MimeType::Jpeg);
        assert_eq!(detect_image_mime_type(&[]), MimeType::Jpeg);
    }

    #[test]
    fn writes_title_first_artist_album_and_cover() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Song A.mp3");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(&silent_mp3(20))
            .unwrap();

        write_tags(&path, &track(), Some(vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0])).unwrap();

        let tagged = read_from_path(&path).unwrap();
        let tag = tagged.primary_tag().unwrap();
        assert_eq!(tag.title().as_deref(), Some("Song A"));
        assert_eq!(tag.artist().as_deref(), Some("Artist X"));
        assert_eq!(tag.album().as_deref(), Some("Album Z"));
        assert_eq!(tag.pictures().len(), 1);
        assert_eq!(tag.pictures()[0].pic_type(), PictureType::CoverFront);
    }

    #[test]
    fn unreadable_file_is_a_tag_write_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.mp3");

        let err = write_tags(&path, &track(), None).unwrap_err();
        assert!(matches!(err, Error::TagWrite { .. }));
    }
}

//! Writes track metadata into downloaded audio files.

use std::{fmt, path::Path};

use lofty::{
    config::WriteOptions,
    error::LoftyError,
    file::{AudioFile, TaggedFileExt},
    picture::{Picture, PictureType},
    tag::{Accessor, ItemKey, Tag},
};
use reqwest::Client;

use crate::{debug, types::TrackMetadata, utils, warning};

#[derive(Debug)]
pub enum TagError {
    Lofty(LoftyError),
    NoTag(String),
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::Lofty(e) => write!(f, "{}", e),
            TagError::NoTag(path) => write!(f, "no writable tag in {}", path),
        }
    }
}

impl std::error::Error for TagError {}

impl From<LoftyError> for TagError {
    fn from(err: LoftyError) -> Self {
        TagError::Lofty(err)
    }
}

/// Downloads the cover art. Failures are logged and yield no picture; a file
/// without art is still worth tagging.
pub async fn fetch_artwork(http: &Client, url: &str) -> Option<Vec<u8>> {
    let response = match http.get(url).send().await.and_then(|r| r.error_for_status()) {
        Ok(r) => r,
        Err(e) => {
            warning!("unable to fetch artwork {}: {}", url, e);
            return None;
        }
    };

    match response.bytes().await {
        Ok(bytes) => Some(bytes.to_vec()),
        Err(e) => {
            warning!("unable to read artwork {}: {}", url, e);
            None
        }
    }
}

/// Replaces the file's primary tag fields with `metadata`.
pub fn write_tags(
    path: &Path,
    metadata: &TrackMetadata,
    artwork: Option<&[u8]>,
) -> Result<(), TagError> {
    let mut tagged = lofty::read_from_path(path)?;

    if tagged.primary_tag().is_none() {
        let tag_type = tagged.primary_tag_type();
        tagged.insert_tag(Tag::new(tag_type));
    }

    {
        let tag = tagged
            .primary_tag_mut()
            .ok_or_else(|| TagError::NoTag(path.display().to_string()))?;

        apply(tag, metadata);

        if let Some(data) = artwork {
            match Picture::from_reader(&mut &data[..]) {
                Ok(mut picture) => {
                    picture.set_pic_type(PictureType::CoverFront);
                    tag.remove_picture_type(PictureType::CoverFront);
                    tag.push_picture(picture);
                }
                Err(e) => warning!("ignoring artwork for {}: {}", path.display(), e),
            }
        }
    }

    tagged.save_to_path(path, WriteOptions::default())?;
    debug!("tagged {}", path.display());
    Ok(())
}

/// Sets the text and number fields of `tag`. Absent values remove the field.
pub fn apply(tag: &mut Tag, metadata: &TrackMetadata) {
    tag.set_title(metadata.title.clone());

    if metadata.artists.is_empty() {
        tag.remove_artist();
    } else {
        tag.set_artist(utils::join_artists(&metadata.artists));
    }

    if metadata.album_artists.is_empty() {
        tag.remove_key(&ItemKey::AlbumArtist);
    } else {
        tag.insert_text(ItemKey::AlbumArtist, utils::join_artists(&metadata.album_artists));
    }

    match &metadata.album_title {
        Some(album) => tag.set_album(album.clone()),
        None => tag.remove_album(),
    }

    match &metadata.release_year {
        Some(year) => {
            tag.insert_text(ItemKey::RecordingDate, year.clone());
        }
        None => tag.remove_key(&ItemKey::RecordingDate),
    }

    match metadata.track_number {
        Some(n) => tag.set_track(n),
        None => tag.remove_track(),
    }
    match metadata.total_tracks {
        Some(n) => tag.set_track_total(n),
        None => tag.remove_track_total(),
    }
    match metadata.disc_number {
        Some(n) => tag.set_disk(n),
        None => tag.remove_disk(),
    }
}

#[cfg(test)]
mod tests {
    use lofty::tag::TagType;

    use super::*;

    fn metadata() -> TrackMetadata {
        TrackMetadata {
            artists: vec!["Simon".into(), "Garfunkel".into()],
            album_artists: vec!["Various Artists".into()],
            title: "The Boxer".into(),
            album_title: Some("Bridge Over Troubled Water".into()),
            release_year: Some("1970".into()),
            art_url: None,
            track_number: Some(6),
            total_tracks: Some(11),
            disc_number: Some(1),
            explicit: false,
        }
    }

    #[test]
    fn applies_every_field() {
        let mut tag = Tag::new(TagType::Id3v2);
        apply(&mut tag, &metadata());

        assert_eq!(tag.title().as_deref(), Some("The Boxer"));
        assert_eq!(tag.artist().as_deref(), Some("Simon; Garfunkel"));
        assert_eq!(tag.get_string(&ItemKey::AlbumArtist), Some("Various Artists"));
        assert_eq!(tag.album().as_deref(), Some("Bridge Over Troubled Water"));
        assert_eq!(tag.get_string(&ItemKey::RecordingDate), Some("1970"));
        assert_eq!(tag.track(), Some(6));
        assert_eq!(tag.track_total(), Some(11));
        assert_eq!(tag.disk(), Some(1));
    }

    #[test]
    fn single_clears_album() {
        let mut tag = Tag::new(TagType::Id3v2);
        apply(&mut tag, &metadata());

        let single = TrackMetadata {
            album_title: None,
            ..metadata()
        };
        apply(&mut tag, &single);
        assert_eq!(tag.album(), None);
    }
}

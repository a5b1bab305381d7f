//! core/metadata.rs
//! Read ID3 tags from downloaded stream bytes into `TrackMetadata`.
//!
//! - Never fails: a missing/unreadable tag yields the fallback labels
//! - Duration prefers the decoder's length, then the tag's TLEN frame

use std::io::Cursor;

use id3::{Tag, TagLike};

use super::types::{FileReference, TrackMetadata};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

pub fn read_metadata(bytes: &[u8], file: &FileReference, length_ms: u64) -> TrackMetadata {
    let tag = match Tag::read_from2(Cursor::new(bytes)) {
        Ok(tag) => Some(tag),
        Err(e) => {
            tracing::debug!("no readable tag in {}: {e}", file.name);
            None
        }
    };

    let text = |get: fn(&Tag) -> Option<&str>| {
        tag.as_ref()
            .and_then(get)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    let tag_duration = tag
        .as_ref()
        .and_then(|t| t.duration())
        .map(u64::from)
        .unwrap_or(0);

    TrackMetadata {
        title: text(Tag::title).unwrap_or_else(|| display_title(&file.name)),
        artist: text(Tag::artist).unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
        album: text(Tag::album).unwrap_or_else(|| UNKNOWN_ALBUM.to_string()),
        duration_ms: if length_ms > 0 { length_ms } else { tag_duration },
    }
}

/// "03 - Song.mp3" -> "03 - Song"
fn display_title(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use id3::Version;

    #[test]
    fn untagged_bytes_fall_back_to_name() {
        let file = FileReference::new(1, "/m/03 - Song.mp3", "03 - Song.mp3");
        let meta = read_metadata(b"not a tag at all", &file, 0);
        assert_eq!(meta.title, "03 - Song");
        assert_eq!(meta.artist, UNKNOWN_ARTIST);
        assert_eq!(meta.album, UNKNOWN_ALBUM);
        assert_eq!(meta.duration_ms, 0);
    }

    #[test]
    fn tag_fields_win_over_fallbacks() {
        let mut tag = Tag::new();
        tag.set_title("Highway");
        tag.set_artist("The Band");
        tag.set_duration(215_000);

        let mut bytes = Vec::new();
        tag.write_to(&mut bytes, Version::Id3v24).unwrap();

        let file = FileReference::new(1, "/m/x.mp3", "x.mp3");
        let meta = read_metadata(&bytes, &file, 0);
        assert_eq!(meta.title, "Highway");
        assert_eq!(meta.artist, "The Band");
        assert_eq!(meta.album, UNKNOWN_ALBUM);
        assert_eq!(meta.duration_ms, 215_000);

        let meta = read_metadata(&bytes, &file, 1000);
        assert_eq!(meta.duration_ms, 1000);
    }

    #[test]
    fn names_without_extension_are_kept() {
        assert_eq!(display_title("README"), "README");
        assert_eq!(display_title(".hidden"), ".hidden");
    }
}

//! Small pure helper functions used by the GUI.
//! - no UI widgets or state mutation

use serde::Deserialize;

use crate::core::types::FileReference;

/// Provider listing responses wrap entries in `{"list": [...]}`;
/// hand-made files are often a bare array. Accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing {
    Wrapped { list: Vec<ListingEntry> },
    Bare(Vec<ListingEntry>),
}

#[derive(Deserialize)]
struct ListingEntry {
    #[serde(default)]
    isdir: u8,
    #[serde(flatten)]
    file: FileReference,
}

/// Parse a provider listing (saved as JSON) into file references.
/// Directories are skipped.
pub(crate) fn parse_listing(text: &str) -> Result<Vec<FileReference>, String> {
    let listing: Listing =
        serde_json::from_str(text).map_err(|e| format!("not a file listing: {e}"))?;

    let entries = match listing {
        Listing::Wrapped { list } => list,
        Listing::Bare(list) => list,
    };

    Ok(entries
        .into_iter()
        .filter(|e| e.isdir == 0)
        .map(|e| e.file)
        .collect())
}

/// 1536 -> "1.5 KB"
pub(crate) fn fmt_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

pub(crate) fn fmt_duration(ms: u64) -> String {
    let s = ms / 1000;
    let m = s / 60;
    let s = s % 60;
    format!("{m}:{s:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_accepts_wrapped_and_bare() {
        let wrapped = r#"{"errno": 0, "list": [
            {"path": "/m", "fs_id": 1, "server_filename": "m", "isdir": 1},
            {"path": "/m/a.mp3", "fs_id": 2, "server_filename": "a.mp3", "size": 10}
        ]}"#;
        let files = parse_listing(wrapped).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, 2);

        let bare = r#"[{"path": "/b.mp3", "fs_id": 3, "server_filename": "b.mp3"}]"#;
        assert_eq!(parse_listing(bare).unwrap()[0].name, "b.mp3");

        assert!(parse_listing("{}").is_err());
    }

    #[test]
    fn sizes_and_durations() {
        assert_eq!(fmt_size(512), "512 B");
        assert_eq!(fmt_size(1536), "1.5 KB");
        assert_eq!(fmt_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(fmt_duration(0), "0:00");
        assert_eq!(fmt_duration(215_000), "3:35");
    }
}

//! core/playlist/history.rs
//! Recently played, newest first, de-duplicated by path.

use std::collections::VecDeque;

use crate::core::types::FileReference;

pub const RECENT_CAPACITY: usize = 30;

#[derive(Debug, Clone, Default)]
pub struct RecentHistory {
    entries: VecDeque<FileReference>,
}

impl RecentHistory {
    /// Rebuild from a persisted list. Later duplicates and overflow are dropped.
    pub fn from_entries(entries: Vec<FileReference>) -> Self {
        let mut out: VecDeque<FileReference> = VecDeque::with_capacity(RECENT_CAPACITY);
        for file in entries {
            if out.len() == RECENT_CAPACITY {
                break;
            }
            if !out.iter().any(|f| f.path == file.path) {
                out.push_back(file);
            }
        }
        Self { entries: out }
    }

    /// Move `file` to the front (inserting it if new) and trim the tail.
    pub fn touch(&mut self, file: FileReference) {
        self.entries.retain(|f| f.path != file.path);
        self.entries.push_front(file);
        self.entries.truncate(RECENT_CAPACITY);
    }

    pub fn to_vec(&self) -> Vec<FileReference> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileReference> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(n: usize) -> FileReference {
        FileReference::new(n as u64, format!("/r/{n}.mp3"), format!("{n}.mp3"))
    }

    #[test]
    fn keeps_thirty_most_recent_first() {
        let mut h = RecentHistory::default();
        for n in 0..31 {
            h.touch(file(n));
        }

        let names: Vec<u64> = h.iter().map(|f| f.id).collect();
        assert_eq!(h.len(), RECENT_CAPACITY);
        assert_eq!(names[0], 30);
        assert_eq!(names[29], 1);
        assert!(!names.contains(&0));
    }

    #[test]
    fn re_adding_moves_to_front_without_growing() {
        let mut h = RecentHistory::default();
        for n in 0..5 {
            h.touch(file(n));
        }
        h.touch(file(2));

        let ids: Vec<u64> = h.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1, 0]);
    }

    #[test]
    fn from_entries_dedupes_and_caps() {
        let mut raw: Vec<FileReference> = (0..40).map(file).collect();
        raw.insert(1, file(0));

        let h = RecentHistory::from_entries(raw);
        assert_eq!(h.len(), RECENT_CAPACITY);
        let ids: Vec<u64> = h.iter().map(|f| f.id).collect();
        assert_eq!(ids[..3], [0, 1, 2]);
    }
}

//! Filename clustering.
//!
//! Files measured as one experimental series usually share a long run of
//! characters in their names (`Fe_foil_scan_001.dat`, `Fe_foil_scan_002.dat`).
//! [`group_files`] walks a sorted file listing, chains adjacent names that
//! share the same longest common substring, then collapses keys that are
//! substrings of other keys.

use serde::Serialize;
use tracing::debug;

/// One cluster: the shared substring and the files that carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileGroup {
    pub key: String,
    pub files: Vec<String>,
}

impl FileGroup {
    fn push_unique(&mut self, file: &str) {
        if !self.files.iter().any(|existing| existing == file) {
            self.files.push(file.to_string());
        }
    }
}

/// Group key to member filenames, in key discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FileGroups {
    groups: Vec<FileGroup>,
}

impl FileGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|group| group.key == key)
            .map(|group| group.files.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileGroup> {
        self.groups.iter()
    }

    /// Every filename that ended up in some group.
    pub fn grouped_files(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|group| group.files.iter().map(String::as_str))
    }

    fn entry(&mut self, key: &str) -> &mut FileGroup {
        let position = match self.groups.iter().position(|group| group.key == key) {
            Some(position) => position,
            None => {
                self.groups.push(FileGroup {
                    key: key.to_string(),
                    files: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        &mut self.groups[position]
    }
}

impl IntoIterator for FileGroups {
    type Item = FileGroup;
    type IntoIter = std::vec::IntoIter<FileGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Longest contiguous run of characters present in both strings.
///
/// Ties resolve to the leftmost match in `a`. Returns an empty string when
/// the inputs share no character.
pub fn longest_common_substring(a: &str, b: &str) -> String {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() || b_chars.is_empty() {
        return String::new();
    }

    // run[j + 1] holds the length of the common run ending at a[i], b[j].
    let mut previous = vec![0_usize; b_chars.len() + 1];
    let mut current = vec![0_usize; b_chars.len() + 1];
    let mut best_len = 0;
    let mut best_end = 0;

    for (i, a_char) in a_chars.iter().enumerate() {
        for (j, b_char) in b_chars.iter().enumerate() {
            current[j + 1] = if a_char == b_char { previous[j] + 1 } else { 0 };
            if current[j + 1] > best_len {
                best_len = current[j + 1];
                best_end = i + 1;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    a_chars[best_end - best_len..best_end].iter().collect()
}

/// Clusters a sorted filename listing by shared substrings.
pub fn group_files<S: AsRef<str>>(filenames: &[S]) -> FileGroups {
    let mut groups = chain_adjacent(filenames);
    collapse_redundant_keys(&mut groups);
    groups
}

fn chain_adjacent<S: AsRef<str>>(filenames: &[S]) -> FileGroups {
    let mut groups = FileGroups::new();
    let mut pattern = String::new();

    for pair in filenames.windows(2) {
        let (current, next) = (pair[0].as_ref(), pair[1].as_ref());
        let common = longest_common_substring(current, next);

        if pattern.is_empty() {
            if common.is_empty() {
                debug!(current, next, "no common substring, chain not started");
                continue;
            }
            let group = groups.entry(&common);
            group.push_unique(current);
            group.push_unique(next);
            pattern = common;
        } else if common == pattern {
            groups.entry(&pattern).push_unique(next);
        } else {
            debug!(pattern = %pattern, next, "chain ended");
            pattern.clear();
        }
    }

    groups
}

/// Merges every key that is a substring of a longer surviving key into it.
///
/// Keys are visited longest first (ties lexicographic), so the surviving
/// set is fixed before any shorter key is considered and the outcome does
/// not depend on discovery order.
fn collapse_redundant_keys(groups: &mut FileGroups) {
    let mut order: Vec<usize> = (0..groups.groups.len()).collect();
    order.sort_by(|&left, &right| {
        let left_key = &groups.groups[left].key;
        let right_key = &groups.groups[right].key;
        right_key
            .chars()
            .count()
            .cmp(&left_key.chars().count())
            .then_with(|| left_key.cmp(right_key))
    });

    let mut survivors: Vec<usize> = Vec::with_capacity(order.len());
    let mut absorbed = vec![false; groups.groups.len()];

    for index in order {
        let key = groups.groups[index].key.clone();
        let target = survivors
            .iter()
            .copied()
            .find(|&survivor| groups.groups[survivor].key.contains(key.as_str()));

        match target {
            Some(survivor) => {
                let files = std::mem::take(&mut groups.groups[index].files);
                let merged = &mut groups.groups[survivor];
                debug!(absorbed = %key, into = %merged.key, "collapsing redundant group key");
                for file in &files {
                    merged.push_unique(file);
                }
                merged.files.sort();
                absorbed[index] = true;
            }
            None => survivors.push(index),
        }
    }

    let mut position = 0;
    groups.groups.retain(|_| {
        let keep = !absorbed[position];
        position += 1;
        keep
    });
}

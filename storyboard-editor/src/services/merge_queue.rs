//! Pending merge links
//!
//! A link `k` means "merge scene k with scene k + 1". Manual links come from
//! user toggles; automatic links come from the short-scene scan and live in
//! their own set so they can be recomputed or cleared independently.

use std::collections::BTreeSet;

/// Contiguous run of scene numbers to merge in one request
pub type MergeGroup = Vec<u32>;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeQueue {
    manual: BTreeSet<u32>,
    automatic: BTreeSet<u32>,
}

impl MergeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove a manual link; valid for `1 <= link < scene_count`
    ///
    /// Returns whether the link is now set, or `None` for an invalid link.
    pub fn toggle(&mut self, link: u32, scene_count: usize) -> Option<bool> {
        if link == 0 || link as usize >= scene_count {
            return None;
        }
        if self.manual.remove(&link) {
            Some(false)
        } else {
            self.manual.insert(link);
            Some(true)
        }
    }

    /// Recompute automatic links from per-scene sentence counts
    ///
    /// `counts[i]` is the sentence count of scene `i + 1`. Every scene below
    /// `threshold` flags the link to its left neighbor; scene 1 flags the
    /// link to its right neighbor instead.
    pub fn queue_short_scenes(&mut self, counts: &[usize], threshold: usize) -> usize {
        self.automatic = short_scene_links(counts, threshold);
        self.automatic.len()
    }

    pub fn manual_links(&self) -> &BTreeSet<u32> {
        &self.manual
    }

    pub fn automatic_links(&self) -> &BTreeSet<u32> {
        &self.automatic
    }

    /// Union of manual and automatic links, ascending
    pub fn links(&self) -> BTreeSet<u32> {
        self.manual.union(&self.automatic).copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.automatic.is_empty()
    }

    /// Scene numbers touched by manual links
    pub fn manual_scenes(&self) -> BTreeSet<u32> {
        flagged_scenes(&self.manual)
    }

    /// Scene numbers touched by automatic links
    pub fn automatic_scenes(&self) -> BTreeSet<u32> {
        flagged_scenes(&self.automatic)
    }

    /// Merge groups in commit order (highest scene number first)
    pub fn commit_plan(&self) -> Vec<MergeGroup> {
        let mut groups = merge_groups(&self.links());
        groups.reverse();
        groups
    }

    /// Drop the links covered by a committed group
    pub fn remove_group(&mut self, group: &[u32]) {
        if let (Some(&first), Some(&last)) = (group.first(), group.last()) {
            for link in first..last {
                self.manual.remove(&link);
                self.automatic.remove(&link);
            }
        }
    }

    pub fn clear_manual(&mut self) {
        self.manual.clear();
    }

    pub fn clear_automatic(&mut self) {
        self.automatic.clear();
    }

    pub fn clear(&mut self) {
        self.manual.clear();
        self.automatic.clear();
    }
}

/// Links flagged by scenes shorter than `threshold`
pub fn short_scene_links(counts: &[usize], threshold: usize) -> BTreeSet<u32> {
    let scene_count = counts.len();
    counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count < threshold)
        .filter_map(|(i, _)| {
            let scene_number = (i + 1) as u32;
            if scene_number == 1 {
                (scene_count > 1).then_some(1)
            } else {
                Some(scene_number - 1)
            }
        })
        .collect()
}

/// Collapse links into maximal runs of scene numbers, ascending
///
/// `{2, 3, 5}` becomes `[[2, 3, 4], [5, 6]]`.
pub fn merge_groups(links: &BTreeSet<u32>) -> Vec<MergeGroup> {
    let mut groups = Vec::new();
    let mut run: Option<(u32, u32)> = None;

    for &link in links {
        run = match run {
            Some((start, end)) if link == end + 1 => Some((start, link)),
            Some((start, end)) => {
                groups.push((start..=end + 1).collect());
                Some((link, link))
            }
            None => Some((link, link)),
        };
    }
    if let Some((start, end)) = run {
        groups.push((start..=end + 1).collect());
    }
    groups
}

fn flagged_scenes(links: &BTreeSet<u32>) -> BTreeSet<u32> {
    links.iter().flat_map(|&k| [k, k + 1]).collect()
}

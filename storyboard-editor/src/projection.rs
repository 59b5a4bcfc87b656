//! Read-only scene list projection
//!
//! Filtering, sorting, pagination and aggregate counts derived from the
//! scene list on every read. Nothing here mutates scenes.

use crate::models::{Scene, SceneStatus};
use crate::services::merge_queue::{merge_groups, MergeQueue};
use serde::Serialize;

/// Default scenes per page
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Status filter for the projected list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(SceneStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Scene number
    #[default]
    Index,
    /// pending < approved < generating < ready < error, then scene number
    Status,
}

/// Query over the scene list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub status_filter: StatusFilter,
    pub sort_by: SortKey,
    /// Requested 1-based page; clamped on projection
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status_filter: StatusFilter::All,
            sort_by: SortKey::Index,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed, clamped)
    pub page: usize,
    /// Total number of pages (at least 1)
    pub total_pages: usize,
    /// Index of the first item on the page
    pub offset: usize,
}

/// Calculate pagination metadata
///
/// # Examples
/// ```
/// use storyboard_editor::projection::calculate_pagination;
///
/// let p = calculate_pagination(17, 3, 8);
/// assert_eq!((p.page, p.total_pages, p.offset), (3, 3, 16));
///
/// // Out-of-bounds pages are clamped; an empty list still has one page
/// let p = calculate_pagination(0, 5, 8);
/// assert_eq!((p.page, p.total_pages, p.offset), (1, 1, 0));
/// ```
pub fn calculate_pagination(total: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = ((total + page_size - 1) / page_size).max(1);
    let page = requested_page.clamp(1, total_pages);
    Pagination {
        page,
        total_pages,
        offset: (page - 1) * page_size,
    }
}

/// One projected page
#[derive(Debug, Clone)]
pub struct SceneView<'a> {
    /// Scenes on the current page
    pub scenes: Vec<&'a Scene>,
    /// Scenes matching the query across all pages
    pub total_filtered: usize,
    pub pagination: Pagination,
}

/// Owned copy of a projected page
#[derive(Debug, Clone, PartialEq)]
pub struct ScenePage {
    pub scenes: Vec<Scene>,
    pub total_filtered: usize,
    pub pagination: Pagination,
}

impl SceneView<'_> {
    pub fn to_page(&self) -> ScenePage {
        ScenePage {
            scenes: self.scenes.iter().map(|s| (*s).clone()).collect(),
            total_filtered: self.total_filtered,
            pagination: self.pagination,
        }
    }
}

/// Filter, sort and page the scene list
pub fn project<'a>(scenes: &'a [Scene], query: &ViewQuery) -> SceneView<'a> {
    let needle = query.search.trim().to_lowercase();
    let mut filtered: Vec<&Scene> = scenes
        .iter()
        .filter(|scene| {
            needle.is_empty()
                || scene.text.to_lowercase().contains(&needle)
                || scene.title.to_lowercase().contains(&needle)
        })
        .filter(|scene| match query.status_filter {
            StatusFilter::All => true,
            StatusFilter::Only(status) => scene.status == status,
        })
        .collect();

    match query.sort_by {
        SortKey::Index => filtered.sort_by_key(|s| s.scene_number),
        SortKey::Status => filtered.sort_by_key(|s| (s.status.sort_rank(), s.scene_number)),
    }

    let total_filtered = filtered.len();
    let pagination = calculate_pagination(total_filtered, query.page, query.page_size);
    let page_size = query.page_size.max(1);
    let scenes = filtered
        .into_iter()
        .skip(pagination.offset)
        .take(page_size)
        .collect();

    SceneView {
        scenes,
        total_filtered,
        pagination,
    }
}

/// Scene counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SceneStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub generating: usize,
    pub ready: usize,
    pub error: usize,
}

impl SceneStats {
    pub fn from_scenes(scenes: &[Scene]) -> Self {
        scenes.iter().fold(
            Self {
                total: scenes.len(),
                ..Self::default()
            },
            |mut stats, scene| {
                match scene.status {
                    SceneStatus::Pending => stats.pending += 1,
                    SceneStatus::Approved => stats.approved += 1,
                    SceneStatus::Generating => stats.generating += 1,
                    SceneStatus::Ready => stats.ready += 1,
                    SceneStatus::Error => stats.error += 1,
                }
                stats
            },
        )
    }
}

/// True when there is at least one scene and none is pending review
pub fn can_generate_images(scenes: &[Scene]) -> bool {
    !scenes.is_empty() && scenes.iter().all(|s| s.status != SceneStatus::Pending)
}

/// Pending merge counts and flagged scene numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub manual_links: usize,
    pub auto_links: usize,
    pub manual_scenes: Vec<u32>,
    pub auto_scenes: Vec<u32>,
    /// Requests a commit would send
    pub pending_groups: usize,
}

impl MergeSummary {
    pub fn from_queue(queue: &MergeQueue) -> Self {
        Self {
            manual_links: queue.manual_links().len(),
            auto_links: queue.automatic_links().len(),
            manual_scenes: queue.manual_scenes().into_iter().collect(),
            auto_scenes: queue.automatic_scenes().into_iter().collect(),
            pending_groups: merge_groups(&queue.links()).len(),
        }
    }
}

//! Page model and the storage boundary.
//!
//! A [`Page`] is the unit a surface renders: an ordered list of committed
//! strokes (oldest first), an optional background image reference and the
//! dimensions the background is stretched to. Pages are replaced wholesale
//! on navigation and on `sync_board`; the only incremental edits are
//! appending a committed stroke and erasing strokes.
//!
//! Persistence lives behind [`PageStore`]. The engine never retries a failed
//! call; the in-memory page is kept regardless so local work is not lost.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use frames::{Dimensions, Stroke};
use serde::{Deserialize, Serialize};

use crate::camera::{Camera, Point};
use crate::hit;

/// Identifier of a stored page.
pub type PageId = String;

/// What the storage collaborator returns for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub background_image_url: Option<String>,
}

/// Error surfaced by a [`PageStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("page {0} not found")]
    PageNotFound(PageId),
    #[error("notebook {0} not found")]
    NotebookNotFound(String),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Storage collaborator for pages. Calls are synchronous from the engine's
/// point of view.
pub trait PageStore {
    /// Ordered page ids of a notebook.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotebookNotFound`] or a backend failure.
    fn list_pages(&self, notebook: &str) -> Result<Vec<PageId>, StoreError>;

    /// Load one page.
    ///
    /// # Errors
    ///
    /// [`StoreError::PageNotFound`] or a backend failure.
    fn load_page(&self, page: &PageId) -> Result<PageRecord, StoreError>;

    /// Persist the stroke list of a page.
    ///
    /// # Errors
    ///
    /// [`StoreError::PageNotFound`] or a backend failure.
    fn save_page(&mut self, page: &PageId, strokes: &[Stroke]) -> Result<(), StoreError>;

    /// Append a new empty page to a notebook and return its id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotebookNotFound`] or a backend failure.
    fn create_page(&mut self, notebook: &str) -> Result<PageId, StoreError>;

    /// Persist a new background reference (`None` clears it).
    ///
    /// # Errors
    ///
    /// [`StoreError::PageNotFound`] or a backend failure.
    fn set_background(&mut self, page: &PageId, url: Option<&str>) -> Result<(), StoreError>;
}

// =============================================================
// Page
// =============================================================

/// The page currently shown on a surface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Storage id, if this page came from a store.
    pub id: Option<PageId>,
    strokes: Vec<Stroke>,
    background: Option<String>,
    /// Rectangle the background is stretched into, in world units.
    pub dimensions: Dimensions,
    unsaved: bool,
}

impl Page {
    /// An empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A page loaded from storage.
    #[must_use]
    pub fn from_record(id: PageId, record: PageRecord) -> Self {
        Self {
            id: Some(id),
            strokes: record.strokes,
            background: record.background_image_url,
            dimensions: Dimensions::default(),
            unsaved: false,
        }
    }

    /// Committed strokes, oldest first.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    #[must_use]
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    /// Whether strokes changed since the last load or successful save.
    #[must_use]
    pub fn is_unsaved(&self) -> bool {
        self.unsaved
    }

    /// Append a committed stroke.
    pub fn commit(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
        self.unsaved = true;
    }

    /// Erase strokes under a screen-space eraser position. Returns the count removed.
    pub fn erase_at(&mut self, camera: &Camera, eraser_screen: Point) -> usize {
        let removed = hit::erase(&mut self.strokes, camera, eraser_screen);
        if removed > 0 {
            self.unsaved = true;
        }
        removed
    }

    /// Replace the stroke list with an authoritative snapshot.
    pub fn replace_strokes(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes;
    }

    /// Set or clear the background reference.
    pub fn set_background(&mut self, url: Option<String>) {
        self.background = url;
    }

    /// Clear the unsaved flag after a successful save.
    pub fn mark_saved(&mut self) {
        self.unsaved = false;
    }
}

// =============================================================
// MemoryPageStore
// =============================================================

/// In-memory [`PageStore`] for local-only sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryPageStore {
    notebooks: HashMap<String, Vec<PageId>>,
    pages: HashMap<PageId, PageRecord>,
    next_id: u64,
    fail_writes: bool,
}

impl MemoryPageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notebook with `pages` empty pages.
    pub fn add_notebook(&mut self, notebook: &str, pages: usize) -> Vec<PageId> {
        let ids: Vec<PageId> = (0..pages).map(|_| self.allocate(PageRecord::default())).collect();
        self.notebooks.insert(notebook.to_owned(), ids.clone());
        ids
    }

    /// Make every write fail with [`StoreError::Backend`] until turned off.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Direct read access for inspection.
    #[must_use]
    pub fn record(&self, page: &PageId) -> Option<&PageRecord> {
        self.pages.get(page)
    }

    fn allocate(&mut self, record: PageRecord) -> PageId {
        self.next_id += 1;
        let id = format!("page-{}", self.next_id);
        self.pages.insert(id.clone(), record);
        id
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Backend("writes disabled".to_owned()));
        }
        Ok(())
    }

    fn record_mut(&mut self, page: &PageId) -> Result<&mut PageRecord, StoreError> {
        self.pages.get_mut(page).ok_or_else(|| StoreError::PageNotFound(page.clone()))
    }
}

impl PageStore for MemoryPageStore {
    fn list_pages(&self, notebook: &str) -> Result<Vec<PageId>, StoreError> {
        self.notebooks
            .get(notebook)
            .cloned()
            .ok_or_else(|| StoreError::NotebookNotFound(notebook.to_owned()))
    }

    fn load_page(&self, page: &PageId) -> Result<PageRecord, StoreError> {
        self.pages.get(page).cloned().ok_or_else(|| StoreError::PageNotFound(page.clone()))
    }

    fn save_page(&mut self, page: &PageId, strokes: &[Stroke]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.record_mut(page)?.strokes = strokes.to_vec();
        Ok(())
    }

    fn create_page(&mut self, notebook: &str) -> Result<PageId, StoreError> {
        self.check_writable()?;
        if !self.notebooks.contains_key(notebook) {
            return Err(StoreError::NotebookNotFound(notebook.to_owned()));
        }
        let id = self.allocate(PageRecord::default());
        if let Some(pages) = self.notebooks.get_mut(notebook) {
            pages.push(id.clone());
        }
        Ok(id)
    }

    fn set_background(&mut self, page: &PageId, url: Option<&str>) -> Result<(), StoreError> {
        self.check_writable()?;
        self.record_mut(page)?.background_image_url = url.map(str::to_owned);
        Ok(())
    }
}

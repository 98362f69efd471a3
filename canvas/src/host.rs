//! Notebook navigation on the display.
//!
//! [`PageHost`] holds the ordered page ids of one notebook and which one the
//! display engine is showing. Leaving a page saves it first; if that save
//! fails, navigation is aborted so the strokes stay on screen.

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;

use tracing::{info, warn};

use crate::doc::{Page, PageId, PageStore, StoreError};
use crate::engine::{Action, EngineCore};

/// Page list and cursor for one notebook, backed by a [`PageStore`].
#[derive(Debug)]
pub struct PageHost<S: PageStore> {
    store: S,
    notebook: String,
    pages: Vec<PageId>,
    index: usize,
}

impl<S: PageStore> PageHost<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store, notebook: String::new(), pages: Vec::new(), index: 0 }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn current(&self) -> Option<&PageId> {
        self.pages.get(self.index)
    }

    /// One-based position and page count, `(0, 0)` before `open`.
    #[must_use]
    pub fn position(&self) -> (usize, usize) {
        if self.pages.is_empty() { (0, 0) } else { (self.index + 1, self.pages.len()) }
    }

    /// Load a notebook's first page. An empty notebook gets one new page.
    ///
    /// # Errors
    ///
    /// Any [`StoreError`] from listing, creating or loading.
    pub fn open(&mut self, notebook: &str, engine: &mut EngineCore) -> Result<Vec<Action>, StoreError> {
        let mut pages = self.store.list_pages(notebook)?;
        if pages.is_empty() {
            pages.push(self.store.create_page(notebook)?);
        }
        info!(notebook, pages = pages.len(), "opened notebook");
        self.notebook = notebook.to_owned();
        self.pages = pages;
        self.index = 0;
        self.show(engine)
    }

    /// Persist the current page's strokes if they changed.
    ///
    /// # Errors
    ///
    /// The store's error; the page stays marked unsaved.
    pub fn save(&mut self, engine: &mut EngineCore) -> Result<(), StoreError> {
        if !engine.page().is_unsaved() {
            return Ok(());
        }
        let Some(id) = self.current().cloned() else {
            return Ok(());
        };
        if let Err(err) = self.store.save_page(&id, engine.page().strokes()) {
            warn!(page = %id, error = %err, "save failed");
            return Err(err);
        }
        engine.mark_saved();
        Ok(())
    }

    /// Go to the next page. A no-op on the last page.
    ///
    /// # Errors
    ///
    /// A failed save (navigation aborted) or load.
    pub fn next_page(&mut self, engine: &mut EngineCore) -> Result<Vec<Action>, StoreError> {
        if self.index + 1 >= self.pages.len() {
            return Ok(Vec::new());
        }
        self.save(engine)?;
        self.index += 1;
        self.show(engine)
    }

    /// Go to the previous page. A no-op on the first page.
    ///
    /// # Errors
    ///
    /// A failed save (navigation aborted) or load.
    pub fn prev_page(&mut self, engine: &mut EngineCore) -> Result<Vec<Action>, StoreError> {
        if self.index == 0 || self.pages.is_empty() {
            return Ok(Vec::new());
        }
        self.save(engine)?;
        self.index -= 1;
        self.show(engine)
    }

    /// Append a page to the notebook and show it.
    ///
    /// # Errors
    ///
    /// A failed save (nothing created) or a failed create or load.
    pub fn add_page(&mut self, engine: &mut EngineCore) -> Result<Vec<Action>, StoreError> {
        self.save(engine)?;
        let id = self.store.create_page(&self.notebook)?;
        self.pages.push(id);
        self.index = self.pages.len() - 1;
        self.show(engine)
    }

    /// Persist a new background for the current page and re-broadcast.
    ///
    /// # Errors
    ///
    /// The store's error; the engine is left unchanged.
    pub fn set_background(&mut self, url: Option<String>, engine: &mut EngineCore) -> Result<Vec<Action>, StoreError> {
        if let Some(id) = self.current().cloned() {
            self.store.set_background(&id, url.as_deref())?;
        }
        Ok(engine.set_background(url))
    }

    fn show(&mut self, engine: &mut EngineCore) -> Result<Vec<Action>, StoreError> {
        let Some(id) = self.current().cloned() else {
            return Ok(Vec::new());
        };
        let record = self.store.load_page(&id)?;
        Ok(engine.load_page(Page::from_record(id, record)))
    }
}

use std::path::Path;

use thiserror::Error;
use tracing::{debug, error, info};

use crate::catalog::{self, CategoryOption, SortKey, ViewQuery};
use crate::client::{CatalogBackend, ClientError};
use crate::model::{Book, BookDraft, BookId};
use crate::prompt::Prompt;

pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this book?";
pub const NOTICE_ADDED: &str = "Book added successfully!";
pub const NOTICE_UPDATED: &str = "Book updated successfully!";
pub const NOTICE_DELETE_CANCELLED: &str = "Delete action canceled.";

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("no book is armed for commit, run edit first")]
    NothingArmed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Idle,
    Editing { id: BookId },
}

impl EditState {
    pub fn armed_id(&self) -> Option<&BookId> {
        match self {
            EditState::Idle => None,
            EditState::Editing { id } => Some(id),
        }
    }
}

/// Issued when a list fetch starts. Only the most recently issued ticket's
/// result is allowed to replace the displayed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket {
    generation: u64,
}

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogView {
    pub books: Vec<Book>,
    pub categories: Vec<CategoryOption>,
    pub query: ViewQuery,
    pub total: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeleteOutcome {
    Deleted(CatalogView),
    Cancelled,
}

pub struct CatalogController<B, P> {
    backend: B,
    prompt: P,
    query: ViewQuery,
    fetched: Vec<Book>,
    categories: Vec<CategoryOption>,
    edit: EditState,
    issued: u64,
    applied: u64,
}

impl<B: CatalogBackend, P: Prompt> CatalogController<B, P> {
    pub fn new(backend: B, prompt: P) -> Self {
        Self {
            backend,
            prompt,
            query: ViewQuery::default(),
            fetched: Vec::new(),
            categories: vec![CategoryOption::all()],
            edit: EditState::Idle,
            issued: 0,
            applied: 0,
        }
    }

    pub fn with_query(mut self, query: ViewQuery) -> Self {
        self.query = query;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn set_query(&mut self, query: ViewQuery) {
        self.query = query;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.query.category = category.into();
    }

    pub fn set_sort(&mut self, sort: Option<SortKey>) {
        self.query.sort = sort;
    }

    pub fn edit_state(&self) -> &EditState {
        &self.edit
    }

    pub fn categories(&self) -> &[CategoryOption] {
        &self.categories
    }

    pub fn view(&self) -> CatalogView {
        let books = catalog::apply_query(&self.fetched, &self.query)
            .into_iter()
            .cloned()
            .collect();
        CatalogView {
            books,
            categories: self.categories.clone(),
            query: self.query.clone(),
            total: self.fetched.len(),
        }
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket {
            generation: self.issued,
        }
    }

    /// Applies a fetched set if `ticket` is newer than the last applied one.
    /// Returns whether the set was applied.
    pub fn finish_refresh(&mut self, ticket: RefreshTicket, books: Vec<Book>) -> bool {
        if ticket.generation <= self.applied {
            debug!(
                generation = ticket.generation,
                applied = self.applied,
                "discarding stale refresh"
            );
            return false;
        }
        self.applied = ticket.generation;
        self.categories = catalog::category_options(&books);
        self.fetched = books;
        debug!(
            generation = ticket.generation,
            records = self.fetched.len(),
            "refresh applied"
        );
        true
    }

    pub async fn refresh(&mut self) -> Result<CatalogView, ControllerError> {
        let ticket = self.begin_refresh();
        let books = self.backend.list_books().await.map_err(|e| {
            error!(error = %e, "failed to fetch books");
            e
        })?;
        self.finish_refresh(ticket, books);
        Ok(self.view())
    }

    pub async fn create(&mut self, draft: &BookDraft) -> Result<CatalogView, ControllerError> {
        self.backend.create_book(draft).await.map_err(|e| {
            error!(error = %e, "failed to add book");
            e
        })?;
        info!(title = %draft.title, "book added");
        self.prompt.notify(NOTICE_ADDED);
        self.refresh().await
    }

    pub async fn delete(&mut self, id: &BookId) -> Result<DeleteOutcome, ControllerError> {
        if !self.prompt.confirm(CONFIRM_DELETE) {
            info!(%id, "delete cancelled");
            self.prompt.notify(NOTICE_DELETE_CANCELLED);
            return Ok(DeleteOutcome::Cancelled);
        }
        self.backend.delete_book(id).await.map_err(|e| {
            error!(%id, error = %e, "error deleting the book");
            e
        })?;
        info!(%id, "book deleted");
        Ok(DeleteOutcome::Deleted(self.refresh().await?))
    }

    /// First phase of an update: fetch the record, arm the commit binding
    /// for it and hand back its fields as a draft. Arming replaces any
    /// previous binding.
    pub async fn edit(&mut self, id: &BookId) -> Result<BookDraft, ControllerError> {
        let book = self.backend.get_book(id).await.map_err(|e| {
            error!(%id, error = %e, "error fetching book data");
            e
        })?;
        if let Some(previous) = self.edit.armed_id().filter(|prev| *prev != id) {
            debug!(%previous, %id, "replacing armed edit");
        }
        self.edit = EditState::Editing { id: id.clone() };
        Ok(BookDraft::from(&book))
    }

    pub async fn commit(&mut self, draft: &BookDraft) -> Result<CatalogView, ControllerError> {
        let id = self
            .edit
            .armed_id()
            .cloned()
            .ok_or(ControllerError::NothingArmed)?;
        self.backend.update_book(&id, draft).await.map_err(|e| {
            error!(%id, error = %e, "error updating book");
            e
        })?;
        self.edit = EditState::Idle;
        info!(%id, "book updated");
        self.prompt.notify(NOTICE_UPDATED);
        self.refresh().await
    }

    pub fn cancel_edit(&mut self) {
        self.edit = EditState::Idle;
    }

    pub async fn download(&self, dest: &Path, progress: bool) -> Result<u64, ControllerError> {
        let written = self.backend.download_to(dest, progress).await.map_err(|e| {
            error!(error = %e, "failed to download database snapshot");
            e
        })?;
        info!(path = %dest.display(), bytes = written, "snapshot saved");
        Ok(written)
    }
}

//! The content set: an ordered, cursor-addressed sequence of documents.
//!
//! A [`Book`] is pure state. None of its operations perform transport I/O;
//! the session controller decides when the current page is (re)rendered.

use crate::pager::actions::ActionRegistry;
use crate::pager::document::Document;
use crate::pager::error::{BookError, ConstructionError};
use std::time::Duration;

/// Ordered pages plus the cursor addressing them, the attached action
/// registry and the idle timeout after which a session decays.
///
/// Two addressing schemes coexist deliberately:
///
/// * [`set_cursor`](Book::set_cursor) is 0-based and wraps around at both
///   ends, so relative navigation never fails;
/// * [`set_page_number`](Book::set_page_number) is 1-based and strict, so a
///   user-supplied absolute page is validated rather than wrapped.
#[derive(Debug)]
pub struct Book {
    pages: Vec<Document>,
    cursor: usize,
    actions: ActionRegistry,
    timeout: Duration,
}

impl Book {
    /// Creates an empty book with the default action registry.
    ///
    /// # Errors
    ///
    /// Fails if `timeout` is zero.
    pub fn new(timeout: Duration) -> Result<Self, ConstructionError> {
        Self::with_actions(timeout, ActionRegistry::defaults())
    }

    /// Creates an empty book with a caller-supplied action registry.
    ///
    /// # Errors
    ///
    /// Fails if `timeout` is zero.
    pub fn with_actions(
        timeout: Duration,
        actions: ActionRegistry,
    ) -> Result<Self, ConstructionError> {
        if timeout.is_zero() {
            return Err(ConstructionError::NonPositiveTimeout);
        }
        Ok(Self {
            pages: Vec::new(),
            cursor: 0,
            actions,
            timeout,
        })
    }

    pub(crate) const fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Appends a page to the end.
    pub fn append(&mut self, page: Document) {
        self.pages.push(page);
    }

    /// Inserts a page at a 0-based index in `[0, len]`.
    ///
    /// # Errors
    ///
    /// [`BookError::InsertOutOfRange`] if `index > len`; the book is left
    /// untouched.
    pub fn insert(&mut self, index: usize, page: Document) -> Result<(), BookError> {
        if index > self.pages.len() {
            return Err(BookError::InsertOutOfRange {
                index,
                len: self.pages.len(),
            });
        }
        self.pages.insert(index, page);
        Ok(())
    }

    /// The 0-based cursor.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor, wrapping at both ends: `-1` addresses the last page
    /// and `len` wraps back to the first. Defined only for non-empty books;
    /// on an empty book this is a no-op.
    pub fn set_cursor(&mut self, index: i64) {
        let len = self.pages.len() as i64;
        if len == 0 {
            return;
        }
        self.cursor = index.rem_euclid(len) as usize;
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page_number(&self) -> usize {
        self.cursor + 1
    }

    /// Sets the 1-based page number. Unlike the cursor this does not wrap.
    ///
    /// # Errors
    ///
    /// [`BookError::PageOutOfRange`] if `page` is outside `[1, len]`.
    pub fn set_page_number(&mut self, page: usize) -> Result<(), BookError> {
        if page == 0 || page > self.pages.len() {
            return Err(BookError::PageOutOfRange {
                page,
                len: self.pages.len(),
            });
        }
        self.cursor = page - 1;
        Ok(())
    }

    /// The page under the cursor.
    ///
    /// # Panics
    ///
    /// Panics on an empty book; the session controller guarantees a book is
    /// non-empty before it becomes active.
    #[must_use]
    pub fn current(&self) -> &Document {
        &self.pages[self.cursor]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn contains(&self, page: &Document) -> bool {
        self.pages.contains(page)
    }

    /// Iterates pages in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.pages.iter()
    }
}

impl<'a> IntoIterator for &'a Book {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}

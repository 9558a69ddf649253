//! Word-boundary pagination of raw text into documents.
//!
//! [`paginate`] is the pure entry point. [`TextPager`] composes a
//! [`Book`] with a packing buffer for callers that interleave free text with
//! pre-made documents.

use crate::pager::actions::ActionRegistry;
use crate::pager::book::Book;
use crate::pager::document::Document;
use crate::pager::error::{ConstructionError, PaginateError};
use std::time::Duration;

/// Per-page framing: a prefix and suffix wrapped around every page body, and
/// the total character budget per page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub prefix: String,
    pub suffix: String,
    pub max_size: usize,
    /// Optional cap on content lines per page, on top of the character
    /// budget.
    pub max_lines: Option<usize>,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            suffix: String::new(),
            max_size: 1900,
            max_lines: None,
        }
    }
}

impl PageLayout {
    /// Characters the framing contributes to a sealed page, its joining
    /// newlines included.
    fn frame_chars(&self) -> usize {
        let mut chars = 0;
        if !self.prefix.is_empty() {
            chars += self.prefix.chars().count() + 1;
        }
        if !self.suffix.is_empty() {
            chars += self.suffix.chars().count() + 1;
        }
        chars
    }

    /// Characters left for one line once the framing is paid for.
    fn line_budget(&self) -> usize {
        self.max_size.saturating_sub(self.frame_chars())
    }
}

/// Splits `lines` into size-bounded page documents at word boundaries.
///
/// Lines at or over the per-line budget are repeatedly cut at the last
/// whitespace before the budget boundary; the produced segments concatenate
/// back to the original line exactly.
///
/// # Errors
///
/// [`PaginateError::OversizeToken`] when a line has no whitespace within the
/// budget. Never truncates.
pub fn paginate<I, S>(
    prefix: &str,
    suffix: &str,
    max_size: usize,
    lines: I,
) -> Result<Vec<Document>, PaginateError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut paginator = TextPaginator::new(PageLayout {
        prefix: prefix.to_owned(),
        suffix: suffix.to_owned(),
        max_size,
        max_lines: None,
    });
    for line in lines {
        paginator.add_line(line.as_ref(), false)?;
    }
    Ok(paginator
        .into_pages()
        .into_iter()
        .map(|body| Document::new().body(body))
        .collect())
}

/// Greedy line-packing buffer. Seals the open page whenever the next line
/// would push it past the budget.
#[derive(Debug)]
struct TextPaginator {
    layout: PageLayout,
    open: Vec<String>,
    open_chars: usize,
    pages: Vec<String>,
}

impl TextPaginator {
    fn new(layout: PageLayout) -> Self {
        let open_chars = layout.frame_chars();
        Self {
            layout,
            open: Vec::new(),
            open_chars,
            pages: Vec::new(),
        }
    }

    /// Adds one logical line, splitting it at word boundaries if it exceeds
    /// the budget. With `follow_with_empty` a blank separator line follows.
    fn add_line(&mut self, line: &str, follow_with_empty: bool) -> Result<(), PaginateError> {
        let budget = self.layout.line_budget();
        let mut rest: Vec<char> = line.chars().collect();

        while rest.len() >= budget {
            // Backtrack from the budget boundary to the nearest whitespace.
            let cut = rest[..budget].iter().rposition(|c| c.is_whitespace());
            let Some(cut) = cut else {
                return Err(PaginateError::OversizeToken {
                    token: rest.into_iter().collect(),
                    budget,
                });
            };
            let segment: String = rest[..=cut].iter().collect();
            self.push_line(&segment);
            rest.drain(..=cut);
        }

        let tail: String = rest.into_iter().collect();
        self.push_line(&tail);
        if follow_with_empty {
            self.push_line("");
        }
        Ok(())
    }

    /// Appends a fitting line to the open page, sealing first if it would
    /// overflow the character budget or the line cap. `open_chars` tracks
    /// the exact length of the page as it would be sealed right now, so the
    /// first line on a page carries no separator cost.
    fn push_line(&mut self, line: &str) {
        let chars = line.chars().count();
        if !self.open.is_empty() {
            let over_chars = self.open_chars + chars + 1 > self.layout.max_size;
            let over_lines = self
                .layout
                .max_lines
                .is_some_and(|cap| self.open.len() >= cap);
            if over_chars || over_lines {
                self.close_page();
            }
        }
        if !self.open.is_empty() {
            self.open_chars += 1;
        }
        self.open_chars += chars;
        self.open.push(line.to_owned());
    }

    fn close_page(&mut self) {
        if self.open.is_empty() {
            return;
        }
        let mut parts: Vec<&str> = Vec::with_capacity(self.open.len() + 2);
        if !self.layout.prefix.is_empty() {
            parts.push(&self.layout.prefix);
        }
        parts.extend(self.open.iter().map(String::as_str));
        if !self.layout.suffix.is_empty() {
            parts.push(&self.layout.suffix);
        }
        self.pages.push(parts.join("\n"));

        self.open.clear();
        self.open_chars = self.layout.frame_chars();
    }

    fn into_pages(mut self) -> Vec<String> {
        self.close_page();
        self.pages
    }
}

/// A book fed from raw text: owns one [`Book`] plus the packing buffer and
/// forwards to both. Pre-made documents and paginated text can be mixed; the
/// paginated pages land at the end when the pager is finalized, and only the
/// first of them carries the title.
#[derive(Debug)]
pub struct TextPager {
    book: Book,
    paginator: TextPaginator,
    title: String,
}

impl TextPager {
    /// A text pager over a fresh book with the default actions.
    ///
    /// # Errors
    ///
    /// Fails if `timeout` is zero.
    pub fn new(
        title: impl Into<String>,
        timeout: Duration,
        layout: PageLayout,
    ) -> Result<Self, ConstructionError> {
        Ok(Self::with_book(
            title,
            Book::with_actions(timeout, ActionRegistry::defaults())?,
            layout,
        ))
    }

    /// A text pager over a caller-built book (custom actions, pre-made
    /// pages).
    pub fn with_book(title: impl Into<String>, book: Book, layout: PageLayout) -> Self {
        Self {
            book,
            paginator: TextPaginator::new(layout),
            title: title.into(),
        }
    }

    /// Adds one line of text.
    ///
    /// # Errors
    ///
    /// [`PaginateError::OversizeToken`] for an unsplittable oversized line.
    pub fn add_line(&mut self, line: &str, follow_with_empty: bool) -> Result<(), PaginateError> {
        self.paginator.add_line(line, follow_with_empty)
    }

    /// Adds a paragraph: the text is split on newlines and followed by a
    /// blank separator line.
    ///
    /// # Errors
    ///
    /// [`PaginateError::OversizeToken`] for an unsplittable oversized line.
    pub fn add_lines(&mut self, text: &str) -> Result<(), PaginateError> {
        for line in text.split('\n') {
            self.add_line(line, false)?;
        }
        self.add_line("", false)
    }

    /// Appends a pre-made document ahead of the paginated text.
    pub fn append(&mut self, page: Document) {
        self.book.append(page);
    }

    /// Seals the buffer and returns the finished book.
    #[must_use]
    pub fn into_book(self) -> Book {
        let Self {
            mut book,
            paginator,
            title,
        } = self;

        for (index, body) in paginator.into_pages().into_iter().enumerate() {
            let mut page = Document::new().body(body);
            if index == 0 {
                page = page.title(title.clone());
            }
            book.append(page);
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bodies(pages: &[Document]) -> Vec<&str> {
        pages.iter().filter_map(|d| d.body.as_deref()).collect()
    }

    #[test]
    fn token_without_whitespace_fails() {
        let err = paginate("", "", 10, ["abcdefghijklmnop"]).expect_err("no split point");
        assert_eq!(
            err,
            PaginateError::OversizeToken {
                token: "abcdefghijklmnop".to_owned(),
                budget: 10,
            }
        );
    }

    #[test]
    fn splits_at_last_whitespace_within_budget() {
        let pages = paginate("", "", 10, ["abcde fghij klmno"]).expect("splittable");
        let segments = bodies(&pages);

        assert_eq!(segments, ["abcde ", "fghij ", "klmno"]);
        for segment in &segments {
            assert!(segment.chars().count() <= 10, "{segment:?} over budget");
        }
        assert_eq!(segments.concat(), "abcde fghij klmno");
    }

    #[test]
    fn packs_short_lines_until_the_page_is_full() {
        let pages = paginate("", "", 10, ["aaa", "bbb", "ccc"]).expect("fits");
        assert_eq!(bodies(&pages), ["aaa\nbbb", "ccc"]);
    }

    #[test]
    fn framing_appears_on_every_page_and_shrinks_the_budget() {
        let pages = paginate("```", "```", 16, ["one two", "three"]).expect("fits");
        for body in bodies(&pages) {
            assert!(body.starts_with("```\n"), "{body:?}");
            assert!(body.ends_with("\n```"), "{body:?}");
        }
    }

    #[test]
    fn framed_pages_never_exceed_the_budget() {
        // The frame's joining newlines count against the budget too: a
        // two-line page here would come to 9 chars.
        let pages = paginate("p", "s", 8, ["ab", "cd"]).expect("fits");
        let segments = bodies(&pages);

        assert_eq!(segments, ["p\nab\ns", "p\ncd\ns"]);
        for body in &segments {
            assert!(body.chars().count() <= 8, "{body:?} over budget");
        }
    }

    #[test]
    fn max_lines_caps_page_height() {
        let mut pager = TextPager::new(
            "T",
            Duration::from_secs(120),
            PageLayout {
                max_lines: Some(2),
                ..PageLayout::default()
            },
        )
        .expect("valid timeout");

        for line in ["a", "b", "c", "d", "e"] {
            pager.add_line(line, false).expect("fits");
        }
        let book = pager.into_book();

        let pages: Vec<_> = book.iter().filter_map(|d| d.body.as_deref()).collect();
        assert_eq!(pages, ["a\nb", "c\nd", "e"]);
    }

    #[test]
    fn oversize_failure_reports_the_unsplittable_remainder() {
        // The head splits fine, the trailing token does not.
        let err = paginate("", "", 8, ["ab cd efghijklmnop"]).expect_err("tail has no space");
        assert_eq!(
            err,
            PaginateError::OversizeToken {
                token: "efghijklmnop".to_owned(),
                budget: 8,
            }
        );
    }

    #[test]
    fn text_pager_titles_only_the_first_sealed_page() {
        let mut pager = TextPager::new(
            "Manual",
            Duration::from_secs(120),
            PageLayout {
                max_size: 10,
                ..PageLayout::default()
            },
        )
        .expect("valid timeout");

        pager.add_line("aaaa bbbb cccc", false).expect("splittable");
        let book = pager.into_book();

        assert!(book.len() > 1);
        let titles: Vec<_> = book.iter().map(|d| d.title.as_deref()).collect();
        assert_eq!(titles[0], Some("Manual"));
        assert!(titles[1..].iter().all(Option::is_none));
    }

    #[test]
    fn paragraph_gets_a_blank_separator_line() {
        let mut pager =
            TextPager::new("T", Duration::from_secs(120), PageLayout::default()).expect("valid");
        pager.add_lines("first\nsecond").expect("fits");
        pager.add_line("third", false).expect("fits");
        let book = pager.into_book();

        assert_eq!(book.len(), 1);
        assert_eq!(
            book.current().body.as_deref(),
            Some("first\nsecond\n\nthird")
        );
    }

    #[test]
    fn premade_documents_precede_paginated_text() {
        let mut pager =
            TextPager::new("T", Duration::from_secs(120), PageLayout::default()).expect("valid");
        pager.append(Document::new().title("cover"));
        pager.add_line("text", false).expect("fits");
        let book = pager.into_book();

        assert_eq!(book.len(), 2);
        assert_eq!(book.current().title.as_deref(), Some("cover"));
    }
}

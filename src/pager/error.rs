//! Error taxonomy for the pagination core.

use thiserror::Error;

/// Invalid arguments at construction time. These are programming errors on
/// the caller's side and are never recovered from.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("timeout must be positive and nonzero")]
    NonPositiveTimeout,

    #[error("action symbol {0:?} is registered more than once")]
    DuplicateSymbol(String),

    #[error("action symbol {0:?} must be exactly one glyph")]
    MultiGlyphSymbol(String),
}

/// Out-of-range mutation on a [`Book`](crate::pager::Book). Surfaced to the
/// caller, never silently clamped.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BookError {
    #[error("page number {page} is outside range [1, {len}]")]
    PageOutOfRange { page: usize, len: usize },

    #[error("insert index {index} is outside range [0, {len}]")]
    InsertOutOfRange { index: usize, len: usize },
}

/// Failure while splitting raw text into pages.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PaginateError {
    /// A single token has no whitespace within the page budget. The caller
    /// decides what to do; the paginator never truncates.
    #[error("token of {} chars has no whitespace within budget {budget}", token.chars().count())]
    OversizeToken { token: String, budget: usize },
}

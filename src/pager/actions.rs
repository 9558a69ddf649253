//! Actions: named handlers bound to single-glyph trigger symbols.
//!
//! An [`Action`] is an explicit value pairing a symbol with a boxed async
//! handler over the live session handle. The default registry reproduces the
//! classic seven-button pager: jump-first, previous, numeric-jump, next,
//! jump-last, close, close-and-delete.

use crate::pager::error::ConstructionError;
use crate::pager::session::{Flow, SessionError, SessionHandle};
use crate::transport::{Outcome, ReplyFilter};
use futures_util::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

/// Symbol of the jump-to-first-page action.
pub const SYM_JUMP_FIRST: &str = "⏮";
/// Symbol of the previous-page action.
pub const SYM_PREVIOUS: &str = "◀";
/// Symbol of the numeric-jump action.
pub const SYM_NUMERIC_JUMP: &str = "🔢";
/// Symbol of the next-page action.
pub const SYM_NEXT: &str = "▶";
/// Symbol of the jump-to-last-page action.
pub const SYM_JUMP_LAST: &str = "⏭";
/// Symbol of the close action.
pub const SYM_CLOSE: &str = "✅";
/// Symbol of the close-and-delete action.
pub const SYM_CLOSE_AND_DELETE: &str = "🗑";

const NUMERIC_JUMP_PROMPT: &str = "Enter a page number, or an offset such as +2 or -1.";

/// Boxed async handler invoked when the action's trigger fires.
pub type Handler =
    Arc<dyn for<'a> Fn(SessionHandle<'a>) -> BoxFuture<'a, Result<Flow, SessionError>> + Send + Sync>;

/// A handler bound to a single-glyph trigger symbol.
pub struct Action {
    symbol: String,
    always_show: bool,
    handler: Handler,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("symbol", &self.symbol)
            .field("always_show", &self.always_show)
            .finish_non_exhaustive()
    }
}

impl Action {
    /// Binds `handler` to `symbol`.
    ///
    /// `always_show` controls visibility on single-page books: actions with
    /// it unset are attached only when more than one page exists.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::MultiGlyphSymbol`] unless `symbol` is exactly one
    /// grapheme cluster.
    pub fn new<H>(
        symbol: impl Into<String>,
        always_show: bool,
        handler: H,
    ) -> Result<Self, ConstructionError>
    where
        H: for<'a> Fn(SessionHandle<'a>) -> BoxFuture<'a, Result<Flow, SessionError>>
            + Send
            + Sync
            + 'static,
    {
        let symbol = symbol.into();
        if symbol.graphemes(true).count() != 1 {
            return Err(ConstructionError::MultiGlyphSymbol(symbol));
        }
        Ok(Self {
            symbol,
            always_show,
            handler: Arc::new(handler),
        })
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    #[must_use]
    pub const fn always_show(&self) -> bool {
        self.always_show
    }

    /// Clones out the handler so it can run while the book is mutably
    /// borrowed by the session handle.
    pub(crate) fn handler(&self) -> Handler {
        Arc::clone(&self.handler)
    }

    // Internal constructor for the built-in actions, whose symbols are known
    // single glyphs.
    fn builtin<H>(symbol: &str, always_show: bool, handler: H) -> Self
    where
        H: for<'a> Fn(SessionHandle<'a>) -> BoxFuture<'a, Result<Flow, SessionError>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            symbol: symbol.to_owned(),
            always_show,
            handler: Arc::new(handler),
        }
    }
}

/// Ordered collection of [`Action`]s with unique symbols.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: Vec<Action>,
}

impl ActionRegistry {
    /// Builds a registry from the given actions, preserving order.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::DuplicateSymbol`] if two actions share a symbol.
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Result<Self, ConstructionError> {
        let mut registry = Self::default();
        for action in actions {
            registry.push(action)?;
        }
        Ok(registry)
    }

    /// Appends an action.
    ///
    /// # Errors
    ///
    /// [`ConstructionError::DuplicateSymbol`] if the symbol is already bound.
    pub fn push(&mut self, action: Action) -> Result<(), ConstructionError> {
        if self.get(action.symbol()).is_some() {
            return Err(ConstructionError::DuplicateSymbol(action.symbol().to_owned()));
        }
        self.actions.push(action);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.symbol() == symbol)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Actions visible for a book of `page_count` pages: on a single page
    /// only `always_show` actions, otherwise all of them. Re-evaluated by the
    /// session on every render, since handlers may change the page count.
    pub fn visible(&self, page_count: usize) -> impl Iterator<Item = &Action> {
        self.actions
            .iter()
            .filter(move |a| page_count > 1 || a.always_show())
    }

    /// The standard seven-action pager registry.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            actions: vec![
                Action::builtin(SYM_JUMP_FIRST, false, |h| Box::pin(jump_first(h))),
                Action::builtin(SYM_PREVIOUS, false, |h| Box::pin(previous_page(h))),
                Action::builtin(SYM_NUMERIC_JUMP, false, |h| Box::pin(numeric_jump(h))),
                Action::builtin(SYM_NEXT, false, |h| Box::pin(next_page(h))),
                Action::builtin(SYM_JUMP_LAST, false, |h| Box::pin(jump_last(h))),
                Action::builtin(SYM_CLOSE, true, |h| Box::pin(close(h))),
                Action::builtin(SYM_CLOSE_AND_DELETE, true, |h| Box::pin(close_and_delete(h))),
            ],
        }
    }
}

async fn jump_first(h: SessionHandle<'_>) -> Result<Flow, SessionError> {
    h.book.set_cursor(0);
    Ok(Flow::Continue)
}

async fn previous_page(h: SessionHandle<'_>) -> Result<Flow, SessionError> {
    h.book.set_cursor(h.book.cursor() as i64 - 1);
    Ok(Flow::Continue)
}

async fn next_page(h: SessionHandle<'_>) -> Result<Flow, SessionError> {
    h.book.set_cursor(h.book.cursor() as i64 + 1);
    Ok(Flow::Continue)
}

async fn jump_last(h: SessionHandle<'_>) -> Result<Flow, SessionError> {
    h.book.set_cursor(-1);
    Ok(Flow::Continue)
}

async fn close(_h: SessionHandle<'_>) -> Result<Flow, SessionError> {
    Ok(Flow::Close)
}

async fn close_and_delete(_h: SessionHandle<'_>) -> Result<Flow, SessionError> {
    Ok(Flow::CloseAndDelete)
}

/// Prompts the originator for a page number or offset.
///
/// The prompt message is deleted on every exit path: success, sub-timeout and
/// handler failure alike. Invalid or out-of-range absolute input keeps the
/// prompt standing and waits again; the sub-deadline is fixed at entry and is
/// never extended by bad input.
async fn numeric_jump(mut h: SessionHandle<'_>) -> Result<Flow, SessionError> {
    let prompt = match h.transport.send_prompt(h.channel, NUMERIC_JUMP_PROMPT).await {
        Ok(prompt) => prompt,
        Err(err) => {
            warn!(error = %err, "could not send page prompt");
            return Ok(Flow::Continue);
        }
    };

    let result = numeric_jump_loop(&mut h).await;

    if let Err(err) = h.transport.delete(&prompt).await {
        debug!(error = %err, "could not delete page prompt");
    }
    result
}

async fn numeric_jump_loop(h: &mut SessionHandle<'_>) -> Result<Flow, SessionError> {
    let deadline = Instant::now() + h.prompt_timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(Flow::Continue);
        }

        let filter = ReplyFilter {
            channel: h.channel,
            user: h.author,
        };
        let reply = match h.transport.await_reply(filter, remaining).await {
            Outcome::TimedOut => return Ok(Flow::Continue),
            Outcome::Triggered(reply) => reply,
        };

        if let Err(err) = h.transport.delete(&reply.message).await {
            debug!(error = %err, "could not delete page prompt reply");
        }

        let token = reply.text.trim();
        let Ok(value) = token.parse::<i64>() else {
            debug!(token, "unparseable page input, waiting for another reply");
            continue;
        };

        if token.starts_with('+') || value < 0 {
            // Relative offset through the wrapping cursor setter. An offset
            // that overflows the addition is nonsense input and re-prompts
            // like any other unparseable reply.
            let Some(target) = (h.book.cursor() as i64).checked_add(value) else {
                debug!(value, "offset overflows, waiting for another reply");
                continue;
            };
            h.book.set_cursor(target);
            return Ok(Flow::Continue);
        }

        // Absolute 1-based target; out of range keeps the prompt open.
        if value >= 1 && h.book.set_page_number(value as usize).is_ok() {
            return Ok(Flow::Continue);
        }
        debug!(value, len = h.book.len(), "page out of range, waiting for another reply");
    }
}

//! The session controller: drives one book through its interactive lifetime.
//!
//! A session is a single tokio task that renders the current page, attaches
//! the visible triggers, then suspends at exactly one point: the bounded wait
//! for the next matching trigger event. Matching events dispatch an action
//! handler; the idle timeout decays the session. Handlers of one session
//! never run concurrently because there is never more than one wait in
//! flight.

use crate::pager::book::Book;
use crate::pager::document::Document;
use crate::transport::{
    ChannelId, MessageRef, Outcome, PageContent, Transport, TransportError, TriggerFilter, UserId,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const DEFAULT_PROMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// What an action handler tells the controller to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Re-render the (possibly mutated) current page and keep listening.
    Continue,
    /// Decay: detach triggers and blank the status line.
    Close,
    /// Decay and delete both the rendered message and the invoking request.
    CloseAndDelete,
}

/// How the controller reacts to soft transport failures.
///
/// `Detached` (the default) logs and continues, so a session degrades
/// gracefully when e.g. the bot lacks permission to edit triggers. `Strict`
/// propagates every failure, which is what you want while debugging a
/// transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    #[default]
    Detached,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initializing,
    AwaitingTrigger,
    Dispatching,
    Decayed,
}

/// Failure that ends a session. Soft transport failures only surface here in
/// [`ExecMode::Strict`].
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The live binding handed to action handlers: exclusive access to the book
/// plus the transport context of the rendered message.
pub struct SessionHandle<'a> {
    pub book: &'a mut Book,
    pub transport: &'a dyn Transport,
    pub channel: ChannelId,
    pub author: UserId,
    /// The rendered message the session owns.
    pub message: MessageRef,
    /// Deadline budget for nested prompts such as the numeric jump.
    pub prompt_timeout: Duration,
}

/// One interactive viewer session. Owns its book exclusively from start to
/// decay; dropped afterwards.
pub struct Session<T: Transport> {
    transport: Arc<T>,
    book: Book,
    channel: ChannelId,
    author: UserId,
    request: Option<MessageRef>,
    mode: ExecMode,
    prompt_timeout: Duration,
    phase: Phase,
}

impl<T: Transport> Session<T> {
    #[must_use]
    pub fn new(transport: Arc<T>, channel: ChannelId, author: UserId, book: Book) -> Self {
        Self {
            transport,
            book,
            channel,
            author,
            request: None,
            mode: ExecMode::default(),
            prompt_timeout: DEFAULT_PROMPT_TIMEOUT,
            phase: Phase::Initializing,
        }
    }

    /// The invoking request message, deleted by the close-and-delete action.
    #[must_use]
    pub const fn request(mut self, request: MessageRef) -> Self {
        self.request = Some(request);
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: ExecMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = timeout;
        self
    }

    /// Runs the session to completion: render, listen, dispatch, decay.
    ///
    /// # Errors
    ///
    /// The initial render failing is always fatal. Later transport failures
    /// are fatal only in [`ExecMode::Strict`].
    pub async fn run(mut self) -> Result<(), SessionError> {
        if self.book.is_empty() {
            self.book.append(placeholder_page());
        }

        let message = self.transport.render(self.channel, &self.content()).await?;
        info!(
            channel = self.channel.0,
            message = message.id.0,
            pages = self.book.len(),
            "viewer session started"
        );

        let mut attached = self.refresh_triggers(message, &[]).await?;

        loop {
            self.transition(Phase::AwaitingTrigger);
            let filter = TriggerFilter {
                symbols: attached.clone(),
                message,
                user: self.author,
            };

            let event = match self.transport.await_trigger(filter, self.book.timeout()).await {
                Outcome::TimedOut => {
                    self.decay(message).await?;
                    return Ok(());
                }
                Outcome::Triggered(event) => event,
            };

            self.transition(Phase::Dispatching);
            let mark = self
                .transport
                .clear_trigger_mark(&message, &event.symbol, event.user)
                .await;
            self.soft(mark, "clear trigger mark")?;

            let handler = match self.book.actions().get(&event.symbol) {
                Some(action) => action.handler(),
                None => {
                    // The filter only admits attached symbols, so this means
                    // the registry changed under us; skip the event.
                    warn!(symbol = %event.symbol, "trigger event for unknown action");
                    continue;
                }
            };

            let outcome = {
                let handle = SessionHandle {
                    book: &mut self.book,
                    transport: &*self.transport,
                    channel: self.channel,
                    author: self.author,
                    message,
                    prompt_timeout: self.prompt_timeout,
                };
                handler(handle).await
            };

            let flow = match outcome {
                Ok(flow) => flow,
                Err(err) if self.mode == ExecMode::Strict => return Err(err),
                Err(err) => {
                    warn!(symbol = %event.symbol, error = %err, "action handler failed; session continues");
                    Flow::Continue
                }
            };

            match flow {
                Flow::Continue => {
                    let update = self.transport.update(&message, &self.content()).await;
                    self.soft(update, "update page")?;
                    attached = self.refresh_triggers(message, &attached).await?;
                }
                Flow::Close => {
                    self.decay(message).await?;
                    return Ok(());
                }
                Flow::CloseAndDelete => {
                    self.close_and_delete(message).await?;
                    return Ok(());
                }
            }
        }
    }

    fn content(&self) -> PageContent {
        PageContent {
            line: format!("Page {} of {}", self.book.page_number(), self.book.len()),
            document: self.book.current().clone(),
        }
    }

    /// Re-evaluates the visibility rule and syncs the attached triggers if
    /// the visible set changed (it changes when the page count crosses the
    /// one/many boundary).
    async fn refresh_triggers(
        &self,
        message: MessageRef,
        attached: &[String],
    ) -> Result<Vec<String>, SessionError> {
        let visible: Vec<String> = self
            .book
            .actions()
            .visible(self.book.len())
            .map(|a| a.symbol().to_owned())
            .collect();

        if visible == attached {
            return Ok(visible);
        }

        let detach = self.transport.detach_all_triggers(&message).await;
        self.soft(detach, "detach triggers")?;
        for symbol in &visible {
            let attach = self.transport.attach_trigger(&message, symbol).await;
            self.soft(attach, "attach trigger")?;
        }
        Ok(visible)
    }

    /// Terminal transition: triggers detached, status line blanked. The
    /// document itself stays visible.
    async fn decay(&mut self, message: MessageRef) -> Result<(), SessionError> {
        self.transition(Phase::Decayed);
        let detach = self.transport.detach_all_triggers(&message).await;
        self.soft(detach, "detach triggers")?;

        let mut content = self.content();
        content.line.clear();
        let update = self.transport.update(&message, &content).await;
        self.soft(update, "finalize page")?;

        info!(channel = self.channel.0, message = message.id.0, "viewer session decayed");
        Ok(())
    }

    /// Terminal transition: both the rendered message and the invoking
    /// request disappear.
    async fn close_and_delete(&mut self, message: MessageRef) -> Result<(), SessionError> {
        self.transition(Phase::Decayed);
        let delete = self.transport.delete(&message).await;
        self.soft(delete, "delete rendered message")?;

        if let Some(request) = self.request {
            let delete = self.transport.delete(&request).await;
            self.soft(delete, "delete request message")?;
        }

        info!(channel = self.channel.0, message = message.id.0, "viewer session deleted");
        Ok(())
    }

    fn transition(&mut self, next: Phase) {
        debug!(from = ?self.phase, to = ?next, "session phase");
        self.phase = next;
    }

    fn soft(&self, result: Result<(), TransportError>, op: &'static str) -> Result<(), SessionError> {
        match result {
            Ok(()) => Ok(()),
            Err(err) if self.mode == ExecMode::Strict => Err(err.into()),
            Err(err) => {
                warn!(op, error = %err, "transport operation failed; session continues");
                Ok(())
            }
        }
    }
}

/// Injected when a session starts on an empty book.
fn placeholder_page() -> Document {
    Document::new()
        .title("No data!")
        .body("There is nothing to show here. The caller sent an empty book.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_page_is_titled_no_data() {
        let page = placeholder_page();
        assert_eq!(page.title.as_deref(), Some("No data!"));
    }
}

//! The capability contract a viewer session needs from a messaging transport.
//!
//! The pagination core consumes this interface and nothing else; the Telegram
//! implementation lives in [`telegram`]. Ids are opaque to the core: it only
//! ever compares them.

pub mod render;
pub mod telegram;

use crate::pager::Document;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Opaque channel (chat) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub i64);

/// Opaque message identifier, unique within a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Opaque user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub u64);

/// A materialized message: the channel it lives in plus its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub channel: ChannelId,
    pub id: MessageId,
}

/// What a session asks the transport to show: a short status line plus the
/// current document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    /// Plain-text line above the document, e.g. `Page 2 of 5`. Cleared on
    /// decay.
    pub line: String,
    pub document: Document,
}

/// An external trigger signal: somebody activated `symbol` on `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub symbol: String,
    pub message: MessageRef,
    pub user: UserId,
}

/// A plain message somebody sent, observed while a prompt is open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEvent {
    pub message: MessageRef,
    pub user: UserId,
    pub text: String,
}

/// Filter for [`Transport::await_trigger`]: symbol must be one of the
/// attached ones, on the rendered message, from the invoking author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerFilter {
    pub symbols: Vec<String>,
    pub message: MessageRef,
    pub user: UserId,
}

impl TriggerFilter {
    #[must_use]
    pub fn matches(&self, event: &TriggerEvent) -> bool {
        event.message == self.message
            && event.user == self.user
            && self.symbols.iter().any(|s| s == &event.symbol)
    }
}

/// Filter for [`Transport::await_reply`]: same channel, same originator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyFilter {
    pub channel: ChannelId,
    pub user: UserId,
}

impl ReplyFilter {
    #[must_use]
    pub const fn matches(&self, event: &ReplyEvent) -> bool {
        event.message.channel.0 == self.channel.0 && event.user.0 == self.user.0
    }
}

/// Result of a bounded wait. A timeout is a normal outcome, not an error: it
/// is the session's decay transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Triggered(T),
    TimedOut,
}

/// Transport-level failure. The session controller treats most of these as
/// soft (logged, session continues); only the initial render is fatal.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport api error: {0}")]
    Api(String),
}

/// Messaging capabilities consumed by viewer sessions. Implementations must
/// tolerate concurrent use from many sessions.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Materializes content as a new message.
    async fn render(
        &self,
        channel: ChannelId,
        content: &PageContent,
    ) -> Result<MessageRef, TransportError>;

    /// Refreshes an already rendered message in place.
    async fn update(&self, message: &MessageRef, content: &PageContent)
        -> Result<(), TransportError>;

    /// Removes a message.
    async fn delete(&self, message: &MessageRef) -> Result<(), TransportError>;

    /// Makes `symbol` a live trigger on the message.
    async fn attach_trigger(&self, message: &MessageRef, symbol: &str)
        -> Result<(), TransportError>;

    /// Removes every live trigger from the message.
    async fn detach_all_triggers(&self, message: &MessageRef) -> Result<(), TransportError>;

    /// Clears the mark a user left when activating a trigger, where the
    /// transport has such a notion. Implementations without one return `Ok`.
    async fn clear_trigger_mark(
        &self,
        message: &MessageRef,
        symbol: &str,
        user: UserId,
    ) -> Result<(), TransportError>;

    /// Waits for the next trigger event matching `filter`, racing `timeout`.
    /// Events failing the filter are ignored and must not extend the window.
    async fn await_trigger(&self, filter: TriggerFilter, timeout: Duration)
        -> Outcome<TriggerEvent>;

    /// Sends a plain prompt message.
    async fn send_prompt(&self, channel: ChannelId, text: &str)
        -> Result<MessageRef, TransportError>;

    /// Waits for the next reply matching `filter`, racing `timeout`.
    async fn await_reply(&self, filter: ReplyFilter, timeout: Duration) -> Outcome<ReplyEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(channel: i64, id: i32) -> MessageRef {
        MessageRef {
            channel: ChannelId(channel),
            id: MessageId(id),
        }
    }

    #[test]
    fn trigger_filter_checks_symbol_message_and_user() {
        let filter = TriggerFilter {
            symbols: vec!["▶".to_owned(), "✅".to_owned()],
            message: msg(7, 42),
            user: UserId(1),
        };

        let event = |symbol: &str, message, user| TriggerEvent {
            symbol: symbol.to_owned(),
            message,
            user: UserId(user),
        };

        assert!(filter.matches(&event("▶", msg(7, 42), 1)));
        assert!(!filter.matches(&event("◀", msg(7, 42), 1)), "unattached symbol");
        assert!(!filter.matches(&event("▶", msg(7, 41), 1)), "other message");
        assert!(!filter.matches(&event("▶", msg(7, 42), 2)), "other user");
    }

    #[test]
    fn reply_filter_checks_channel_and_user() {
        let filter = ReplyFilter {
            channel: ChannelId(7),
            user: UserId(1),
        };
        let reply = |channel: i64, user: u64| ReplyEvent {
            message: msg(channel, 9),
            user: UserId(user),
            text: "3".to_owned(),
        };

        assert!(filter.matches(&reply(7, 1)));
        assert!(!filter.matches(&reply(8, 1)));
        assert!(!filter.matches(&reply(7, 2)));
    }
}

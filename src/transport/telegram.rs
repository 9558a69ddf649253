//! Telegram transport: inline-keyboard triggers over teloxide.
//!
//! Trigger symbols become inline keyboard buttons whose callback data is the
//! symbol itself. The dispatcher (see `main.rs`) answers callback queries and
//! feeds them into the [`EventHub`], which fans them out to whichever
//! sessions are currently waiting.

use crate::transport::render::page_html;
use crate::transport::{
    ChannelId, MessageId, MessageRef, Outcome, PageContent, ReplyEvent, ReplyFilter, Transport,
    TransportError, TriggerEvent, TriggerFilter, UserId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId as TgMessageId, ParseMode,
};
use tokio::sync::broadcast;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

const BUTTONS_PER_ROW: usize = 4;

impl From<teloxide::RequestError> for TransportError {
    fn from(err: teloxide::RequestError) -> Self {
        Self::Api(err.to_string())
    }
}

/// Fan-out point between the teloxide dispatcher and waiting sessions.
///
/// Events are only observed by waits that are in flight when they arrive;
/// a session that is busy dispatching simply misses the burst, which is
/// exactly the single-in-flight-wait contract.
pub struct EventHub {
    triggers: broadcast::Sender<TriggerEvent>,
    replies: broadcast::Sender<ReplyEvent>,
}

impl EventHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (triggers, _) = broadcast::channel(capacity);
        let (replies, _) = broadcast::channel(capacity);
        Self { triggers, replies }
    }

    /// Publishes a trigger event to all waiting sessions.
    pub fn publish_trigger(&self, event: TriggerEvent) {
        if self.triggers.send(event).is_err() {
            debug!("trigger event dropped, no session waiting");
        }
    }

    /// Publishes an observed plain message.
    pub fn publish_reply(&self, event: ReplyEvent) {
        if self.replies.send(event).is_err() {
            debug!("reply dropped, no prompt waiting");
        }
    }

    /// Waits for the next trigger matching `filter` under one fixed
    /// deadline. Non-matching events are skipped and do not extend it.
    pub async fn next_trigger(
        &self,
        filter: &TriggerFilter,
        timeout: Duration,
    ) -> Outcome<TriggerEvent> {
        let mut rx = self.triggers.subscribe();
        let deadline = Instant::now() + timeout;
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Err(_) => return Outcome::TimedOut,
                Ok(Ok(event)) if filter.matches(&event) => return Outcome::Triggered(event),
                Ok(Ok(event)) => {
                    debug!(symbol = %event.symbol, "ignoring non-matching trigger event");
                }
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    warn!(skipped, "trigger hub lagged, events lost");
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => return Outcome::TimedOut,
            }
        }
    }

    /// Waits for the next reply matching `filter` under one fixed deadline.
    pub async fn next_reply(&self, filter: &ReplyFilter, timeout: Duration) -> Outcome<ReplyEvent> {
        let mut rx = self.replies.subscribe();
        let deadline = Instant::now() + timeout;
        loop {
            match timeout_at(deadline, rx.recv()).await {
                Err(_) => return Outcome::TimedOut,
                Ok(Ok(event)) if filter.matches(&event) => return Outcome::Triggered(event),
                Ok(Ok(_)) => {}
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    warn!(skipped, "reply hub lagged, messages lost");
                }
                Ok(Err(broadcast::error::RecvError::Closed)) => return Outcome::TimedOut,
            }
        }
    }
}

/// [`Transport`] implementation over the Telegram Bot API.
pub struct TelegramTransport {
    bot: Bot,
    hub: Arc<EventHub>,
    /// Symbols currently attached per message; Telegram replaces the whole
    /// keyboard on every edit, so the full set is kept here.
    keyboards: Mutex<HashMap<MessageRef, Vec<String>>>,
}

impl TelegramTransport {
    #[must_use]
    pub fn new(bot: Bot, hub: Arc<EventHub>) -> Self {
        Self {
            bot,
            hub,
            keyboards: Mutex::new(HashMap::new()),
        }
    }

    fn attached(&self, message: &MessageRef) -> Vec<String> {
        self.keyboards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(message)
            .cloned()
            .unwrap_or_default()
    }

    async fn sync_keyboard(&self, message: &MessageRef) -> Result<(), TransportError> {
        let symbols = self.attached(message);
        self.bot
            .edit_message_reply_markup(ChatId(message.channel.0), TgMessageId(message.id.0))
            .reply_markup(keyboard(&symbols))
            .await?;
        Ok(())
    }
}

/// Builds the inline keyboard for the given symbols, a fixed number per row.
fn keyboard(symbols: &[String]) -> InlineKeyboardMarkup {
    let rows = symbols.chunks(BUTTONS_PER_ROW).map(|chunk| {
        chunk
            .iter()
            .map(|symbol| InlineKeyboardButton::callback(symbol.clone(), symbol.clone()))
            .collect::<Vec<_>>()
    });
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn render(
        &self,
        channel: ChannelId,
        content: &PageContent,
    ) -> Result<MessageRef, TransportError> {
        let sent = self
            .bot
            .send_message(ChatId(channel.0), page_html(content))
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(MessageRef {
            channel,
            id: MessageId(sent.id.0),
        })
    }

    async fn update(
        &self,
        message: &MessageRef,
        content: &PageContent,
    ) -> Result<(), TransportError> {
        // Editing the text drops the inline keyboard, so it is re-supplied.
        let symbols = self.attached(message);
        self.bot
            .edit_message_text(
                ChatId(message.channel.0),
                TgMessageId(message.id.0),
                page_html(content),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard(&symbols))
            .await?;
        Ok(())
    }

    async fn delete(&self, message: &MessageRef) -> Result<(), TransportError> {
        self.keyboards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(message);
        self.bot
            .delete_message(ChatId(message.channel.0), TgMessageId(message.id.0))
            .await?;
        Ok(())
    }

    async fn attach_trigger(
        &self,
        message: &MessageRef,
        symbol: &str,
    ) -> Result<(), TransportError> {
        {
            let mut keyboards = self.keyboards.lock().unwrap_or_else(PoisonError::into_inner);
            let symbols = keyboards.entry(*message).or_default();
            if symbols.iter().any(|s| s == symbol) {
                return Ok(());
            }
            symbols.push(symbol.to_owned());
        }
        self.sync_keyboard(message).await
    }

    async fn detach_all_triggers(&self, message: &MessageRef) -> Result<(), TransportError> {
        self.keyboards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(message);
        self.bot
            .edit_message_reply_markup(ChatId(message.channel.0), TgMessageId(message.id.0))
            .await?;
        Ok(())
    }

    async fn clear_trigger_mark(
        &self,
        message: &MessageRef,
        symbol: &str,
        _user: UserId,
    ) -> Result<(), TransportError> {
        // Callback queries are acknowledged by the dispatcher when routed;
        // a button press leaves nothing on the message itself.
        debug!(message = message.id.0, symbol, "trigger mark already cleared");
        Ok(())
    }

    async fn await_trigger(
        &self,
        filter: TriggerFilter,
        timeout: Duration,
    ) -> Outcome<TriggerEvent> {
        self.hub.next_trigger(&filter, timeout).await
    }

    async fn send_prompt(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> Result<MessageRef, TransportError> {
        let sent = self.bot.send_message(ChatId(channel.0), text).await?;
        Ok(MessageRef {
            channel,
            id: MessageId(sent.id.0),
        })
    }

    async fn await_reply(&self, filter: ReplyFilter, timeout: Duration) -> Outcome<ReplyEvent> {
        self.hub.next_reply(&filter, timeout).await
    }
}

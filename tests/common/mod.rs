//! Scripted in-memory transport for driving full session lifecycles.

use async_trait::async_trait;
use flipbook::transport::{
    ChannelId, MessageId, MessageRef, Outcome, PageContent, ReplyEvent, ReplyFilter, Transport,
    TransportError, TriggerEvent, TriggerFilter, UserId,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub const CHANNEL: ChannelId = ChannelId(7);
pub const AUTHOR: UserId = UserId(1);

/// One scripted external stimulus, consumed in order.
#[allow(dead_code)]
pub enum Step {
    /// A trigger from the session author on the rendered message.
    Trigger(&'static str),
    /// A trigger from somebody else; must be ignored without being consumed
    /// as a dispatch.
    ForeignTrigger(&'static str, u64),
    /// The session timeout elapses.
    Timeout,
    /// A reply from the author while a prompt is open.
    Reply(&'static str),
    /// The prompt sub-timeout elapses.
    ReplyTimeout,
}

/// Everything the session asked the transport to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Call {
    Render(PageContent),
    Update(PageContent),
    Delete(MessageRef),
    Attach(String),
    DetachAll,
    ClearMark(String),
    Prompt(String),
}

pub struct MockTransport {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI32,
    fail_triggers: AtomicBool,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(100),
            fail_triggers: AtomicBool::new(false),
        }
    }

    /// Makes trigger attach/detach fail, as if the bot lost permissions.
    pub fn fail_triggers(self) -> Self {
        self.fail_triggers.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn remaining_steps(&self) -> usize {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Lines of every non-decay page update, in order.
    pub fn update_lines(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Update(content) if !content.line.is_empty() => Some(content.line),
                _ => None,
            })
            .collect()
    }

    /// Attached symbol sets, one per detach-and-reattach wave.
    pub fn attach_waves(&self) -> Vec<Vec<String>> {
        let mut waves = Vec::new();
        for call in self.calls() {
            match call {
                Call::DetachAll => waves.push(Vec::new()),
                Call::Attach(symbol) => {
                    if let Some(wave) = waves.last_mut() {
                        wave.push(symbol);
                    }
                }
                _ => {}
            }
        }
        waves.retain(|wave| !wave.is_empty());
        waves
    }

    pub fn deletes(&self) -> Vec<MessageRef> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    fn fresh_ref(&self, channel: ChannelId) -> MessageRef {
        MessageRef {
            channel,
            id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)),
        }
    }

    fn trigger_failure(&self) -> Result<(), TransportError> {
        if self.fail_triggers.load(Ordering::SeqCst) {
            Err(TransportError::Api("permission denied".to_owned()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn render(
        &self,
        channel: ChannelId,
        content: &PageContent,
    ) -> Result<MessageRef, TransportError> {
        self.record(Call::Render(content.clone()));
        Ok(self.fresh_ref(channel))
    }

    async fn update(
        &self,
        _message: &MessageRef,
        content: &PageContent,
    ) -> Result<(), TransportError> {
        self.record(Call::Update(content.clone()));
        Ok(())
    }

    async fn delete(&self, message: &MessageRef) -> Result<(), TransportError> {
        self.record(Call::Delete(*message));
        Ok(())
    }

    async fn attach_trigger(
        &self,
        _message: &MessageRef,
        symbol: &str,
    ) -> Result<(), TransportError> {
        self.trigger_failure()?;
        self.record(Call::Attach(symbol.to_owned()));
        Ok(())
    }

    async fn detach_all_triggers(&self, _message: &MessageRef) -> Result<(), TransportError> {
        self.trigger_failure()?;
        self.record(Call::DetachAll);
        Ok(())
    }

    async fn clear_trigger_mark(
        &self,
        _message: &MessageRef,
        symbol: &str,
        _user: UserId,
    ) -> Result<(), TransportError> {
        self.record(Call::ClearMark(symbol.to_owned()));
        Ok(())
    }

    async fn await_trigger(
        &self,
        filter: TriggerFilter,
        _timeout: Duration,
    ) -> Outcome<TriggerEvent> {
        loop {
            let step = self
                .script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            match step {
                None | Some(Step::Timeout) => return Outcome::TimedOut,
                Some(Step::Trigger(symbol)) => {
                    let event = TriggerEvent {
                        symbol: symbol.to_owned(),
                        message: filter.message,
                        user: filter.user,
                    };
                    if filter.matches(&event) {
                        return Outcome::Triggered(event);
                    }
                    // Not attached right now: ignored, keep waiting.
                }
                Some(Step::ForeignTrigger(symbol, user)) => {
                    let event = TriggerEvent {
                        symbol: symbol.to_owned(),
                        message: filter.message,
                        user: UserId(user),
                    };
                    assert!(!filter.matches(&event), "foreign event unexpectedly matches");
                    // Ignored, keep waiting.
                }
                // A stray reply step outside any prompt; drop it.
                Some(Step::Reply(_) | Step::ReplyTimeout) => {}
            }
        }
    }

    async fn send_prompt(
        &self,
        channel: ChannelId,
        text: &str,
    ) -> Result<MessageRef, TransportError> {
        self.record(Call::Prompt(text.to_owned()));
        Ok(self.fresh_ref(channel))
    }

    async fn await_reply(&self, filter: ReplyFilter, _timeout: Duration) -> Outcome<ReplyEvent> {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        match script.front() {
            Some(Step::Reply(_)) => {
                let Some(Step::Reply(text)) = script.pop_front() else {
                    unreachable!()
                };
                Outcome::Triggered(ReplyEvent {
                    message: MessageRef {
                        channel: filter.channel,
                        id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)),
                    },
                    user: filter.user,
                    text: text.to_owned(),
                })
            }
            Some(Step::ReplyTimeout) => {
                script.pop_front();
                Outcome::TimedOut
            }
            // Steps meant for the outer trigger wait stay queued.
            _ => Outcome::TimedOut,
        }
    }
}

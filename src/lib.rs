//! # flipbook
//!
//! An interactive paginated message viewer for chat bots. A [`pager::Book`]
//! holds an ordered set of renderable documents; a [`pager::Session`] turns
//! it into a live, navigable message driven by trigger events, with a
//! bounded lifetime and graceful decay. The [`transport`] module defines the
//! capability contract sessions need and ships a Telegram implementation.

pub mod config;
pub mod pager;
pub mod transport;

pub use pager::{Action, ActionRegistry, Book, Document, PageLayout, Session, TextPager};

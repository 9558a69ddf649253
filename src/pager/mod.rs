//! The pagination core: documents, books, actions, sessions and the text
//! paginator. Transport-agnostic; everything here talks to the outside world
//! only through [`crate::transport::Transport`].

pub mod actions;
pub mod book;
pub mod document;
pub mod error;
pub mod paginate;
pub mod session;

pub use actions::{Action, ActionRegistry};
pub use book::Book;
pub use document::{AuthorBlock, Document, Field};
pub use error::{BookError, ConstructionError, PaginateError};
pub use paginate::{paginate, PageLayout, TextPager};
pub use session::{ExecMode, Flow, Session, SessionError, SessionHandle};

//! Renderable content units.
//!
//! A [`Document`] is an opaque payload: the pagination core never inspects it
//! beyond handing it to the transport's render call. Which parts a transport
//! honours is up to the transport (the Telegram renderer, for instance, has
//! no native thumbnail slot and folds it into a link).

use serde::{Deserialize, Serialize};

/// One renderable unit of structured content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    /// RGB color hint, `0xRRGGBB`.
    pub color: Option<u32>,
    pub footer: Option<String>,
    pub thumbnail: Option<String>,
    pub author: Option<AuthorBlock>,
    /// Ordered named entries, rendered after the body.
    pub fields: Vec<Field>,
}

/// Attribution block shown above the title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorBlock {
    pub name: String,
    pub url: Option<String>,
    pub icon_url: Option<String>,
}

/// A named entry inside a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub const fn color(mut self, rgb: u32) -> Self {
        self.color = Some(rgb);
        self
    }

    #[must_use]
    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    #[must_use]
    pub fn thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    #[must_use]
    pub fn author(mut self, author: AuthorBlock) -> Self {
        self.author = Some(author);
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

//! Document rendering for Telegram.
//!
//! Telegram has no native embed payload, so a [`Document`] is flattened into
//! one HTML message: author line, bold (optionally linked) title, body,
//! fields as bold-name/value pairs, italic footer. The color hint has no
//! Telegram counterpart and is ignored; a thumbnail becomes a zero-width
//! link so the client picks it up as the preview image.

use crate::pager::Document;
use crate::transport::PageContent;
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Renders the status line plus the document.
#[must_use]
pub fn page_html(content: &PageContent) -> String {
    let mut out = String::new();
    if !content.line.is_empty() {
        out.push_str(&format!("<i>{}</i>\n\n", encode_text(&content.line)));
    }
    out.push_str(&document_html(&content.document));
    out.trim_end().to_owned()
}

/// Renders a single document to Telegram HTML.
#[must_use]
pub fn document_html(doc: &Document) -> String {
    let mut out = String::new();

    if let Some(thumbnail) = &doc.thumbnail {
        out.push_str(&format!(
            "<a href=\"{}\">\u{200b}</a>",
            encode_double_quoted_attribute(thumbnail)
        ));
    }

    if let Some(author) = &doc.author {
        let name = encode_text(&author.name);
        match &author.url {
            Some(url) => out.push_str(&format!(
                "<a href=\"{}\">{name}</a>\n",
                encode_double_quoted_attribute(url)
            )),
            None => out.push_str(&format!("{name}\n")),
        }
    }

    if let Some(title) = &doc.title {
        let title = encode_text(title);
        match &doc.url {
            Some(url) => out.push_str(&format!(
                "<b><a href=\"{}\">{title}</a></b>\n",
                encode_double_quoted_attribute(url)
            )),
            None => out.push_str(&format!("<b>{title}</b>\n")),
        }
    }

    if let Some(body) = &doc.body {
        out.push_str(&format!("{}\n", encode_text(body)));
    }

    for field in &doc.fields {
        out.push_str(&format!(
            "\n<b>{}</b>\n{}\n",
            encode_text(&field.name),
            encode_text(&field.value)
        ));
    }

    if let Some(footer) = &doc.footer {
        out.push_str(&format!("\n<i>{}</i>\n", encode_text(footer)));
    }

    out
}

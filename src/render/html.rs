use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

use super::surface::{Region, RenderError, Surface};
use crate::gallery::{Card, GalleryStatus, StatusMessage};

/// Built-in page used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = include_str!("page.html");

const GALLERY_MARKER: &str = "{{gallery}}";
const STATUS_MARKER: &str = "{{status}}";
const STATE_MARKER: &str = "{{state}}";
const CARD_TEMPLATE_ID: &str = "podcast-card";

/// Static HTML page acting as the gallery's document.
///
/// The template must contain the `{{gallery}}` and `{{status}}` markers and
/// a `<template id="podcast-card">` element. `{{state}}` is optional and
/// receives the gallery status (`loading`, `ready`, ...).
#[derive(Debug, Clone)]
pub struct HtmlPage {
    template: String,
    gallery: String,
    status: String,
    state: GalleryStatus,
}

impl HtmlPage {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            gallery: String::new(),
            status: String::new(),
            state: GalleryStatus::Loading,
        }
    }

    pub fn with_default_template() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }

    /// Reads a page template from disk.
    pub async fn load(path: &Path) -> Result<Self, RenderError> {
        let template = tokio::fs::read_to_string(path).await?;
        tracing::debug!(path = %path.display(), "Loaded page template");
        Ok(Self::new(template))
    }

    /// The page with every marker filled in.
    ///
    /// Markers are substituted in a single pass over the template, so marker
    /// text inside catalog content is never expanded.
    pub fn to_html(&self) -> String {
        let replacements = [
            (GALLERY_MARKER, self.gallery.as_str()),
            (STATUS_MARKER, self.status.as_str()),
            (STATE_MARKER, self.state.as_str()),
        ];

        let mut out = String::with_capacity(self.template.len() + self.gallery.len());
        let mut rest = self.template.as_str();
        while let Some((index, marker, value)) = replacements
            .iter()
            .filter_map(|(marker, value)| rest.find(marker).map(|i| (i, *marker, *value)))
            .min_by_key(|(i, _, _)| *i)
        {
            out.push_str(&rest[..index]);
            out.push_str(value);
            rest = &rest[index + marker.len()..];
        }
        out.push_str(rest);
        out
    }

    /// Writes the page to `path`, creating parent directories.
    ///
    /// The page is written to a sibling temp file and renamed into place, so
    /// a previous build's page is never left half-overwritten.
    pub async fn write_to(&self, path: &Path) -> Result<(), RenderError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension("html.tmp");
        tokio::fs::write(&temp_path, self.to_html()).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::info!(path = %path.display(), "Wrote gallery page");
        Ok(())
    }
}

impl Surface for HtmlPage {
    fn has_region(&self, region: Region) -> bool {
        match region {
            Region::Gallery => self.template.contains(GALLERY_MARKER),
            Region::Status => self.template.contains(STATUS_MARKER),
            Region::CardTemplate => has_card_template(&self.template),
        }
    }

    fn set_status(&mut self, status: GalleryStatus, message: &StatusMessage) {
        self.state = status;
        self.status = match render_status(status, message) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(error = %e, "Failed to render status message");
                String::new()
            }
        };
    }

    fn replace_gallery(&mut self, cards: &[Card]) -> Result<(), RenderError> {
        let mut markup = Markup::new();
        for card in cards {
            write_card(&mut markup, card)?;
        }
        self.gallery = markup.finish()?;
        Ok(())
    }

    fn clear_gallery(&mut self) {
        self.gallery.clear();
    }
}

/// Finds a `<template>` start tag carrying `id="podcast-card"`, whatever the
/// attribute order, quoting or case of the tag name.
fn has_card_template(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    let id_values = [
        format!("id=\"{CARD_TEMPLATE_ID}\""),
        format!("id='{CARD_TEMPLATE_ID}'"),
        format!("id={CARD_TEMPLATE_ID}"),
    ];

    lower.match_indices("<template").any(|(start, tag)| {
        let rest = &lower[start + tag.len()..];
        let Some(end) = rest.find('>') else {
            return false;
        };
        let attrs = &rest[..end];
        if !attrs.starts_with(|c: char| c.is_ascii_whitespace()) {
            return false;
        }
        attrs
            .split_ascii_whitespace()
            .any(|attr| id_values.iter().any(|id| attr.trim_end_matches('/') == id))
    })
}

fn render_status(status: GalleryStatus, message: &StatusMessage) -> Result<String, RenderError> {
    let class = format!("status status--{}", message.kind.as_str());
    let mut markup = Markup::new();
    markup.start(
        "div",
        &[
            ("class", class.as_str()),
            ("role", "status"),
            ("data-state", status.as_str()),
        ],
    )?;
    markup.text_element("strong", &[("class", "status__title")], &message.title)?;
    markup.text_element("p", &[("class", "status__body")], &message.body)?;
    markup.end("div")?;
    markup.finish()
}

fn write_card(markup: &mut Markup, card: &Card) -> Result<(), RenderError> {
    let mut article = vec![("class", "card"), ("data-uuid", card.uuid.as_str())];
    if card.sensitive.is_some() {
        article.push(("data-sensitive", "true"));
    }
    markup.start("article", &article)?;

    // Cover, hidden behind a reveal button for sensitive entries
    let hidden = if card.cover_visible() { "false" } else { "true" };
    markup.start("div", &[("class", "card__media"), ("data-hidden", hidden)])?;
    let mut img = vec![
        ("class", "card__cover"),
        ("src", card.cover.src.as_str()),
        ("alt", card.cover.alt.as_str()),
        ("loading", "lazy"),
    ];
    if !card.cover_visible() {
        img.push(("hidden", ""));
    }
    markup.empty("img", &img)?;
    if let Some(gate) = &card.sensitive {
        markup.text_element(
            "button",
            &[
                ("type", "button"),
                ("class", "card__reveal"),
                ("aria-pressed", gate.aria_pressed()),
            ],
            gate.label(),
        )?;
    }
    markup.end("div")?;

    markup.start("div", &[("class", "card__body")])?;
    markup.text_element("h2", &[("class", "card__title")], &card.title)?;

    let description = &card.description;
    match description.truncated_text() {
        Some(truncated) => {
            markup.text_element(
                "p",
                &[
                    ("class", "card__description"),
                    ("data-full", description.full_text()),
                    ("data-truncated", truncated),
                ],
                description.display_text(),
            )?;
            markup.text_element(
                "button",
                &[
                    ("type", "button"),
                    ("class", "card__toggle"),
                    ("aria-expanded", description.aria_expanded()),
                ],
                description.toggle_label(),
            )?;
        }
        None => {
            markup.text_element(
                "p",
                &[("class", "card__description")],
                description.display_text(),
            )?;
        }
    }

    if let Some(notes) = &card.notes {
        markup.text_element("p", &[("class", "card__notes")], notes)?;
    }

    if let Some(link) = &card.link {
        markup.text_element(
            "a",
            &[
                ("class", "card__link"),
                ("href", link.as_str()),
                ("target", "_blank"),
                ("rel", "noopener noreferrer"),
            ],
            "Visit site",
        )?;
    }

    markup.end("div")?;
    markup.end("article")
}

/// Thin wrapper over the quick-xml writer. Text and attribute values are
/// escaped by the writer.
struct Markup {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Markup {
    fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
        let mut element = BytesStart::new(name);
        for attr in attrs {
            element.push_attribute(*attr);
        }
        self.write(Event::Start(element))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
        let mut element = BytesStart::new(name);
        for attr in attrs {
            element.push_attribute(*attr);
        }
        self.write(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> Result<(), RenderError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), RenderError> {
        self.start(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        self.writer
            .write_event(event)
            .map_err(|e| RenderError::Markup(e.to_string()))
    }

    fn finish(self) -> Result<String, RenderError> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| RenderError::Markup(e.to_string()))
    }
}

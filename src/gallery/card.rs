use std::collections::HashMap;

use crate::util::{strip_markup, truncate_chars, validate_link};

use super::types::{CuratedEntry, PodcastMetadata};

/// Character budget for the collapsed description
pub const DESCRIPTION_LIMIT: usize = 120;
/// Cover shown when the catalog has none (relative to the page)
pub const PLACEHOLDER_COVER: &str = "assets/media/placeholder-cover.svg";

const UNTITLED: &str = "Untitled";
const NO_DESCRIPTION: &str = "No description";

/// Display-ready view of one podcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub uuid: String,
    pub title: String,
    pub description: Description,
    pub cover: Cover,
    /// Curated notes with markup stripped; `None` removes the notes region
    pub notes: Option<String>,
    /// Official site, else the cover image; `None` removes the link
    pub link: Option<String>,
    /// Present only for sensitive entries
    pub sensitive: Option<SensitiveGate>,
}

impl Card {
    /// Whether the cover is currently shown.
    pub fn cover_visible(&self) -> bool {
        self.sensitive.as_ref().map_or(true, SensitiveGate::is_revealed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub src: String,
    pub alt: String,
    pub is_placeholder: bool,
}

/// Description text with an optional expand/collapse toggle.
///
/// Text over the budget starts collapsed; [`Description::toggle`] flips
/// between the truncated and the full text. Short text has no toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    full: String,
    truncated: Option<String>,
    expanded: bool,
}

impl Description {
    pub fn new(raw: Option<&str>, limit: usize) -> Self {
        let text = raw.map(strip_markup).unwrap_or_default();
        let full = if text.is_empty() {
            NO_DESCRIPTION.to_owned()
        } else {
            text
        };

        let truncated = match truncate_chars(&full, limit) {
            std::borrow::Cow::Owned(cut) => Some(cut),
            std::borrow::Cow::Borrowed(_) => None,
        };

        Self {
            full,
            truncated,
            expanded: false,
        }
    }

    /// Text currently displayed.
    pub fn display_text(&self) -> &str {
        match &self.truncated {
            Some(cut) if !self.expanded => cut,
            _ => &self.full,
        }
    }

    pub fn full_text(&self) -> &str {
        &self.full
    }

    pub fn truncated_text(&self) -> Option<&str> {
        self.truncated.as_deref()
    }

    /// Whether a toggle is rendered at all.
    pub fn is_expandable(&self) -> bool {
        self.truncated.is_some()
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Flips between collapsed and expanded. No-op without a toggle.
    pub fn toggle(&mut self) -> bool {
        if self.is_expandable() {
            self.expanded = !self.expanded;
        }
        self.expanded
    }

    /// Value for `aria-expanded`.
    pub fn aria_expanded(&self) -> &'static str {
        if self.expanded {
            "true"
        } else {
            "false"
        }
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.expanded {
            "Show less"
        } else {
            "Show more"
        }
    }
}

/// Reveal gate for sensitive covers. Hidden until toggled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SensitiveGate {
    revealed: bool,
}

impl SensitiveGate {
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn toggle(&mut self) -> bool {
        self.revealed = !self.revealed;
        self.revealed
    }

    /// Value for `aria-pressed`.
    pub fn aria_pressed(&self) -> &'static str {
        if self.revealed {
            "true"
        } else {
            "false"
        }
    }

    pub fn label(&self) -> &'static str {
        if self.revealed {
            "Hide cover"
        } else {
            "Reveal cover"
        }
    }
}

/// Builds cards in curated order.
///
/// Entries without metadata (failed or never fetched) are skipped.
pub fn build_cards(
    entries: &[CuratedEntry],
    metadata: &HashMap<String, PodcastMetadata>,
    description_limit: usize,
) -> Vec<Card> {
    entries
        .iter()
        .filter_map(|entry| {
            let Some(meta) = metadata.get(&entry.uuid) else {
                tracing::debug!(uuid = %entry.uuid, "No metadata for curated entry, skipping card");
                return None;
            };
            Some(build_card(entry, meta, description_limit))
        })
        .collect()
}

/// Builds one card from a curated entry and its catalog metadata.
pub fn build_card(entry: &CuratedEntry, meta: &PodcastMetadata, description_limit: usize) -> Card {
    let title = meta
        .title
        .as_deref()
        .map(strip_markup)
        .filter(|t| !t.is_empty());

    let cover = match meta.cover.as_deref().map(validate_link) {
        Some(Ok(url)) => Cover {
            src: url.to_string(),
            alt: alt_text(title.as_deref()),
            is_placeholder: false,
        },
        Some(Err(e)) => {
            tracing::debug!(uuid = %entry.uuid, error = %e, "Ignoring invalid cover URL");
            placeholder_cover(title.as_deref())
        }
        None => placeholder_cover(title.as_deref()),
    };

    let official_site = meta.official_site.as_deref().and_then(|site| {
        validate_link(site)
            .inspect_err(|e| {
                tracing::debug!(uuid = %entry.uuid, error = %e, "Ignoring invalid official site URL");
            })
            .ok()
    });
    let link = official_site
        .map(|url| url.to_string())
        .or_else(|| (!cover.is_placeholder).then(|| cover.src.clone()));

    let notes = entry
        .notes
        .as_deref()
        .map(strip_markup)
        .filter(|n| !n.is_empty());

    Card {
        uuid: entry.uuid.clone(),
        title: title.unwrap_or_else(|| UNTITLED.to_owned()),
        description: Description::new(meta.description.as_deref(), description_limit),
        cover,
        notes,
        link,
        sensitive: entry.sensitive.then(SensitiveGate::default),
    }
}

fn placeholder_cover(title: Option<&str>) -> Cover {
    Cover {
        src: PLACEHOLDER_COVER.to_owned(),
        alt: alt_text(title),
        is_placeholder: true,
    }
}

fn alt_text(title: Option<&str>) -> String {
    match title {
        Some(title) => format!("Cover art for {title}"),
        None => "Podcast cover art".to_owned(),
    }
}

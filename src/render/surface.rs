use std::fmt;
use thiserror::Error;

use crate::gallery::{Card, GalleryStatus, StatusMessage};

/// Page regions the gallery writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Container replaced by the rendered cards
    Gallery,
    /// Status line element
    Status,
    /// Card markup template
    CardTemplate,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Gallery => "gallery container",
            Region::Status => "status message element",
            Region::CardTemplate => "card template",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    /// The page lacks a region the gallery needs; nothing is rendered
    #[error("Required page region missing: {0}")]
    MissingRegion(Region),

    /// Markup could not be written
    #[error("Failed to write markup: {0}")]
    Markup(String),

    /// Page template or output file I/O
    #[error("Page I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rendering target for the gallery.
///
/// Stands in for the browser document: the orchestrator is its only writer
/// and touches it only after all fetches have settled.
pub trait Surface {
    /// Whether the page provides `region`.
    fn has_region(&self, region: Region) -> bool;

    /// Replaces the status line.
    fn set_status(&mut self, status: GalleryStatus, message: &StatusMessage);

    /// Replaces the whole gallery container with `cards`.
    fn replace_gallery(&mut self, cards: &[Card]) -> Result<(), RenderError>;

    /// Empties the gallery container.
    fn clear_gallery(&mut self);
}

/// Fails with the first missing region, checked in page order.
pub fn check_regions<S: Surface + ?Sized>(surface: &S) -> Result<(), RenderError> {
    [Region::Gallery, Region::Status, Region::CardTemplate]
        .into_iter()
        .find(|region| !surface.has_region(*region))
        .map_or(Ok(()), |region| Err(RenderError::MissingRegion(region)))
}

/// In-memory surface that records what was rendered.
#[derive(Debug, Default)]
pub struct MemorySurface {
    missing: Vec<Region>,
    /// Cards currently in the gallery container
    pub cards: Vec<Card>,
    /// Every status written, oldest first
    pub statuses: Vec<(GalleryStatus, StatusMessage)>,
    /// Number of full gallery replacements
    pub renders: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that reports `region` as absent.
    pub fn without(region: Region) -> Self {
        Self {
            missing: vec![region],
            ..Self::default()
        }
    }

    pub fn last_status(&self) -> Option<&(GalleryStatus, StatusMessage)> {
        self.statuses.last()
    }
}

impl Surface for MemorySurface {
    fn has_region(&self, region: Region) -> bool {
        !self.missing.contains(&region)
    }

    fn set_status(&mut self, status: GalleryStatus, message: &StatusMessage) {
        self.statuses.push((status, message.clone()));
    }

    fn replace_gallery(&mut self, cards: &[Card]) -> Result<(), RenderError> {
        self.cards = cards.to_vec();
        self.renders += 1;
        Ok(())
    }

    fn clear_gallery(&mut self) {
        self.cards.clear();
    }
}

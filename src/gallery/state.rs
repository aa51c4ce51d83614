//! View-state derivation for the gallery.
//!
//! Pure functions only: each fetch cycle produces a fresh [`GalleryViewState`]
//! whose [`StatusMessage`] is what the status line shows.

use crate::api::ApiError;

use super::types::PodcastMetadata;

/// Severity of a status message, rendered as the status element's class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

impl StatusKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusKind::Info => "info",
            StatusKind::Success => "success",
            StatusKind::Warning => "warning",
            StatusKind::Error => "error",
        }
    }
}

/// Short, non-technical status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub title: String,
    pub body: String,
}

impl StatusMessage {
    fn new(kind: StatusKind, title: &str, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_owned(),
            body: body.into(),
        }
    }
}

/// Coarse gallery status, also written to the page as `data-state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryStatus {
    Loading,
    Ready,
    Empty,
    Error,
}

impl GalleryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GalleryStatus::Loading => "loading",
            GalleryStatus::Ready => "ready",
            GalleryStatus::Empty => "empty",
            GalleryStatus::Error => "error",
        }
    }
}

/// Result of one gallery load.
///
/// Valid transitions are `Loading -> Empty | Error | Ready`. A `Ready` state
/// with `failed > 0` carries a warning message but still renders the
/// fetched subset.
#[derive(Debug)]
pub enum GalleryViewState {
    Loading {
        message: StatusMessage,
    },
    Ready {
        podcasts: Vec<PodcastMetadata>,
        failed: usize,
        message: StatusMessage,
    },
    Empty {
        message: StatusMessage,
    },
    Error {
        cause: Option<ApiError>,
        message: StatusMessage,
    },
}

const DEFAULT_LOADING_MESSAGE: &str = "Loading podcasts…";

/// `Loading` with an optional custom body.
pub fn loading(message: Option<&str>) -> GalleryViewState {
    GalleryViewState::Loading {
        message: StatusMessage::new(
            StatusKind::Info,
            "Fetching gallery",
            message.unwrap_or(DEFAULT_LOADING_MESSAGE),
        ),
    }
}

/// `Ready` for a fully successful load.
pub fn ready(podcasts: Vec<PodcastMetadata>) -> GalleryViewState {
    let count = podcasts.len();
    GalleryViewState::Ready {
        podcasts,
        failed: 0,
        message: StatusMessage::new(
            StatusKind::Success,
            "Gallery ready",
            format!("Loaded {} {}.", count, plural(count, "podcast", "podcasts")),
        ),
    }
}

/// `Empty` when the curated list yields nothing to fetch.
pub fn empty() -> GalleryViewState {
    GalleryViewState::Empty {
        message: StatusMessage::new(
            StatusKind::Warning,
            "No podcasts to show",
            "Update your curated list to populate the gallery.",
        ),
    }
}

/// `Error`, with copy chosen from the cause's HTTP status.
pub fn error(cause: Option<ApiError>) -> GalleryViewState {
    let message = error_message(cause.as_ref());
    GalleryViewState::Error { cause, message }
}

/// Overlays a warning on a `Ready` state when some fetches failed.
///
/// The podcasts are kept as-is; only the message changes. Non-`Ready`
/// states and `failed == 0` are returned unchanged.
pub fn with_partial_failures(state: GalleryViewState, failed: usize) -> GalleryViewState {
    match state {
        GalleryViewState::Ready { podcasts, .. } if failed > 0 => {
            let loaded = podcasts.len();
            let total = loaded + failed;
            let message = StatusMessage::new(
                StatusKind::Warning,
                "Gallery loaded with warnings",
                format!(
                    "Loaded {loaded} of {total} {}; {failed} could not be fetched.",
                    plural(total, "podcast", "podcasts")
                ),
            );
            GalleryViewState::Ready {
                podcasts,
                failed,
                message,
            }
        }
        other => other,
    }
}

/// The status line for a state.
pub fn status_copy(state: &GalleryViewState) -> &StatusMessage {
    match state {
        GalleryViewState::Loading { message }
        | GalleryViewState::Ready { message, .. }
        | GalleryViewState::Empty { message }
        | GalleryViewState::Error { message, .. } => message,
    }
}

impl GalleryViewState {
    pub fn status(&self) -> GalleryStatus {
        match self {
            GalleryViewState::Loading { .. } => GalleryStatus::Loading,
            GalleryViewState::Ready { .. } => GalleryStatus::Ready,
            GalleryViewState::Empty { .. } => GalleryStatus::Empty,
            GalleryViewState::Error { .. } => GalleryStatus::Error,
        }
    }

    pub fn message(&self) -> &StatusMessage {
        status_copy(self)
    }

    /// Podcasts shown by this state (empty unless `Ready`).
    pub fn podcasts(&self) -> &[PodcastMetadata] {
        match self {
            GalleryViewState::Ready { podcasts, .. } => podcasts,
            _ => &[],
        }
    }
}

fn error_message(cause: Option<&ApiError>) -> StatusMessage {
    let Some(cause) = cause else {
        return StatusMessage::new(
            StatusKind::Error,
            "Something went wrong",
            "We could not load podcasts. Please try again soon.",
        );
    };

    match cause.status() {
        Some(404) => StatusMessage::new(
            StatusKind::Error,
            "Podcast not found",
            "One or more podcast entries could not be located in NeoDB.",
        ),
        Some(429) => StatusMessage::new(
            StatusKind::Error,
            "Rate limited by NeoDB",
            "NeoDB asked us to slow down. Please retry in a minute.",
        ),
        Some(status) if status >= 500 => StatusMessage::new(
            StatusKind::Error,
            "NeoDB is unavailable",
            "NeoDB is responding slowly. Try refreshing shortly.",
        ),
        _ => StatusMessage::new(StatusKind::Error, "Unable to load podcasts", cause.to_string()),
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

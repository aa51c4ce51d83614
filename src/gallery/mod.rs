//! Curated gallery: the curated list, card view-models, view state and the
//! bootstrap that ties them to a [`Surface`](crate::render::Surface).

mod bootstrap;
mod card;
mod curated;
pub mod state;
mod types;

pub use bootstrap::{Bootstrap, MetadataSource};
pub use card::{
    build_card, build_cards, Card, Cover, Description, SensitiveGate, DESCRIPTION_LIMIT,
    PLACEHOLDER_COVER,
};
pub use curated::{apply_allow_list, load_curated, parse_allow_list, parse_curated};
pub use state::{GalleryStatus, GalleryViewState, StatusKind, StatusMessage};
pub use types::{CuratedEntry, FetchOutcome, PodcastMetadata};

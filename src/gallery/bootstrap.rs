use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use crate::api::ApiClient;
use crate::render::{check_regions, RenderError, Surface};
use crate::storage::{KeyValueStore, MemoryStore, MetadataCache};

use super::card::{build_cards, DESCRIPTION_LIMIT};
use super::curated::{apply_allow_list, load_curated};
use super::state::{self, GalleryViewState};
use super::types::{FetchOutcome, PodcastMetadata};

/// Where gallery metadata comes from.
pub trait MetadataSource {
    /// One outcome per identifier, in input order.
    fn fetch_outcomes(&self, uuids: &[String]) -> impl Future<Output = Vec<FetchOutcome>> + Send;
}

impl MetadataSource for ApiClient {
    fn fetch_outcomes(&self, uuids: &[String]) -> impl Future<Output = Vec<FetchOutcome>> + Send {
        self.fetch_many(uuids)
    }
}

/// Loads the curated list, fetches metadata and renders the gallery.
///
/// A single linear pass; retries belong to the API client.
#[derive(Debug)]
pub struct Bootstrap<M, K = MemoryStore> {
    curated_path: PathBuf,
    allow_list: Vec<String>,
    description_limit: usize,
    source: M,
    cache: Option<MetadataCache<K>>,
}

impl<M: MetadataSource> Bootstrap<M> {
    pub fn new(curated_path: impl Into<PathBuf>, source: M) -> Self {
        Self {
            curated_path: curated_path.into(),
            allow_list: Vec::new(),
            description_limit: DESCRIPTION_LIMIT,
            source,
            cache: None,
        }
    }
}

impl<M: MetadataSource, K: KeyValueStore> Bootstrap<M, K> {
    /// Restricts and reorders the curated list. Empty means no restriction.
    pub fn with_allow_list(mut self, allow_list: Vec<String>) -> Self {
        self.allow_list = allow_list;
        self
    }

    pub fn with_description_limit(mut self, limit: usize) -> Self {
        self.description_limit = limit;
        self
    }

    /// Writes fetched metadata through to `cache`.
    pub fn with_cache<K2: KeyValueStore>(self, cache: MetadataCache<K2>) -> Bootstrap<M, K2> {
        Bootstrap {
            curated_path: self.curated_path,
            allow_list: self.allow_list,
            description_limit: self.description_limit,
            source: self.source,
            cache: Some(cache),
        }
    }

    /// Runs one gallery load against `surface` and returns the final state.
    ///
    /// Curated list failures degrade to an empty gallery and fetch failures
    /// to the error or warning states; neither is returned as `Err`.
    ///
    /// # Errors
    ///
    /// - [`RenderError::MissingRegion`] - the page lacks a required region;
    ///   nothing is fetched or rendered
    /// - [`RenderError::Markup`] - card markup could not be written
    pub async fn run<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
    ) -> Result<GalleryViewState, RenderError> {
        if let Err(e) = check_regions(surface) {
            tracing::error!(error = %e, "Gallery page is incomplete, aborting render");
            return Err(e);
        }

        show(surface, &state::loading(None));

        let entries = match load_curated(&self.curated_path).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(
                    path = %self.curated_path.display(),
                    error = ?e,
                    "Unable to load curated podcasts, continuing with an empty list"
                );
                Vec::new()
            }
        };
        let entries = apply_allow_list(entries, &self.allow_list);

        if entries.is_empty() {
            tracing::info!("Curated list is empty, nothing to fetch");
            let state = state::empty();
            surface.clear_gallery();
            show(surface, &state);
            return Ok(state);
        }

        let uuids: Vec<String> = entries.iter().map(|e| e.uuid.clone()).collect();
        let outcomes = self.source.fetch_outcomes(&uuids).await;

        let mut metadata: HashMap<String, PodcastMetadata> = HashMap::with_capacity(outcomes.len());
        let mut first_error = None;
        let mut failed = 0;
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Fulfilled { uuid, data } => {
                    metadata.insert(uuid, data);
                }
                FetchOutcome::Rejected { uuid, error } => {
                    tracing::debug!(uuid = %uuid, error = %error, "Podcast fetch rejected");
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        if metadata.is_empty() {
            tracing::error!(failed = failed, "Every podcast fetch failed");
            let state = state::error(first_error);
            surface.clear_gallery();
            show(surface, &state);
            return Ok(state);
        }

        self.write_through(&metadata).await;

        let cards = build_cards(&entries, &metadata, self.description_limit);
        surface.replace_gallery(&cards)?;

        let podcasts: Vec<PodcastMetadata> = entries
            .iter()
            .filter_map(|entry| metadata.get(&entry.uuid).cloned())
            .collect();
        let state = state::with_partial_failures(state::ready(podcasts), failed);
        tracing::info!(cards = cards.len(), failed = failed, "Rendered podcast gallery");
        show(surface, &state);
        Ok(state)
    }

    async fn write_through(&self, metadata: &HashMap<String, PodcastMetadata>) {
        let Some(cache) = &self.cache else {
            return;
        };
        for meta in metadata.values() {
            if let Err(e) = cache.put(meta).await {
                tracing::warn!(uuid = %meta.uuid, error = %e, "Failed to cache podcast metadata");
            }
        }
    }
}

fn show<S: Surface + ?Sized>(surface: &mut S, state: &GalleryViewState) {
    surface.set_status(state.status(), state.message());
}

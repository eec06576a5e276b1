use std::{collections::HashSet, sync::Arc};

use futures::{StreamExt, stream};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QuerySelect};
use tracing::{debug, info, warn};

use crate::{
    assets::AssetStore,
    catalog::{self, NewMovie},
    entities::{genre, movie, user},
    error::AppResult,
    llm::SuggestionModel,
    models::{EraFilter, RecommendationResponse, RecommendedItem, Suggestion},
    omdb::{MetadataOutcome, MetadataProvider},
};

const FALLBACK_GENRE: &str = "Cine";
const FALLBACK_REASON: &str = "Recomendación IA";
const EMPTY_RESULT_MSG: &str =
    "La IA sugirió títulos, pero no se pudieron importar o encontrar.";

/// Drives one recommendation request: collect context, query the model,
/// import every suggestion that is missing locally, aggregate.
pub struct Concierge {
    db: DatabaseConnection,
    model: Arc<dyn SuggestionModel>,
    metadata: Arc<dyn MetadataProvider>,
    assets: Arc<AssetStore>,
    max_concurrent: usize,
    catalog_prompt_limit: u64,
    seen_prompt_window: usize,
}

impl Concierge {
    pub fn new(
        db: DatabaseConnection,
        model: Arc<dyn SuggestionModel>,
        metadata: Arc<dyn MetadataProvider>,
        assets: Arc<AssetStore>,
        max_concurrent: usize,
        catalog_prompt_limit: u64,
        seen_prompt_window: usize,
    ) -> Self {
        Self { db, model, metadata, assets, max_concurrent, catalog_prompt_limit, seen_prompt_window }
    }

    pub async fn recommend(
        &self,
        narrative: &str,
        era: EraFilter,
        user_id: Option<i32>,
    ) -> AppResult<RecommendationResponse> {
        let catalog_titles = self.catalog_titles(era).await?;
        let (seen_ids, seen_titles) = self.seen_context(user_id).await?;

        debug!(
            catalog = catalog_titles.len(),
            seen = seen_ids.len(),
            era = era.as_str(),
            "collected prompt context"
        );

        let suggestions =
            self.model.suggest(narrative, era, &catalog_titles, &seen_titles).await?;

        debug!(
            top_picks = suggestions.top_picks.len(),
            also_like = suggestions.also_like.len(),
            "model returned suggestions"
        );

        let top_picks = self.import_batch(suggestions.top_picks, &seen_ids).await;
        let also_like = self.import_batch(suggestions.also_like, &seen_ids).await;

        let mut response = RecommendationResponse { top_picks, also_like, debug_msg: None };
        if response.top_picks.is_empty() && response.also_like.is_empty() {
            debug!("importer returned empty lists");
            response.debug_msg = Some(EMPTY_RESULT_MSG.to_string());
        }
        Ok(response)
    }

    async fn catalog_titles(&self, era: EraFilter) -> AppResult<Vec<String>> {
        let mut query = movie::Entity::find();
        if let Some((lo, hi)) = era.year_bounds() {
            query = query.filter(movie::Column::Year.between(lo, hi));
        }
        let movies = query.limit(self.catalog_prompt_limit).all(&self.db).await?;
        Ok(movies.into_iter().map(|m| m.title).collect())
    }

    /// Full seen id set for the post-filter, plus a bounded recent window of
    /// titles for the prompt.
    async fn seen_context(
        &self,
        user_id: Option<i32>,
    ) -> AppResult<(HashSet<i32>, Vec<String>)> {
        let Some(user_id) = user_id else {
            return Ok((HashSet::new(), Vec::new()));
        };
        let Some(viewer) = user::Entity::find_by_id(user_id).one(&self.db).await? else {
            debug!(user_id, "unknown viewer, skipping seen filter");
            return Ok((HashSet::new(), Vec::new()));
        };

        let seen = viewer.find_related(movie::Entity).all(&self.db).await?;
        let ids = seen.iter().map(|m| m.id).collect();
        let titles = seen
            .iter()
            .rev()
            .take(self.seen_prompt_window)
            .map(|m| m.title.clone())
            .collect();
        Ok((ids, titles))
    }

    /// Failure is per item, never per batch. Entries the viewer already saw
    /// are dropped even when the model suggested them anyway.
    async fn import_batch(
        &self,
        items: Vec<Suggestion>,
        seen_ids: &HashSet<i32>,
    ) -> Vec<RecommendedItem> {
        let imported: Vec<Option<RecommendedItem>> = stream::iter(items)
            .map(|item| self.import_one(item))
            .buffer_unordered(self.max_concurrent.max(1))
            .collect()
            .await;

        imported.into_iter().flatten().filter(|item| !seen_ids.contains(&item.id)).collect()
    }

    async fn import_one(&self, suggestion: Suggestion) -> Option<RecommendedItem> {
        let title = suggestion.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let reason =
            suggestion.reason.clone().unwrap_or_else(|| FALLBACK_REASON.to_string());

        let movie = match self.resolve_or_import(title).await {
            Ok(Some(movie)) => movie,
            Ok(None) => {
                debug!(title = %title, "suggestion could not be resolved or imported");
                return None;
            },
            Err(err) => {
                warn!(title = %title, error = %err, "failed to import suggestion");
                return None;
            },
        };

        let genres = match movie.find_related(genre::Entity).all(&self.db).await {
            Ok(genres) => genres,
            Err(err) => {
                warn!(title = %movie.title, error = %err, "failed to load linked genres");
                Vec::new()
            },
        };
        let display_genre =
            genres.first().map(|g| g.name.clone()).unwrap_or_else(|| FALLBACK_GENRE.to_string());

        Some(RecommendedItem {
            id: movie.id,
            title: movie.title,
            poster: movie.poster,
            genres: vec![display_genre],
            reason,
            year: movie.year,
            runtime: movie.runtime,
        })
    }

    async fn resolve_or_import(&self, title: &str) -> AppResult<Option<movie::Model>> {
        if let Some(existing) = catalog::resolve_title(&self.db, title).await? {
            debug!(title = %title, id = existing.id, "resolved against local catalog");
            return Ok(Some(existing));
        }

        let record = match self.metadata.fetch(title).await? {
            MetadataOutcome::Found(record) => record,
            MetadataOutcome::NotFound => {
                debug!(title = %title, "provider has no match");
                return Ok(None);
            },
        };

        let poster = match self.assets.download_poster(record.poster_url.as_deref()).await {
            Ok(path) => Some(path),
            Err(err) => {
                debug!(title = %record.title, error = %err, "no poster stored");
                None
            },
        };
        let trailer_url = self.assets.find_trailer(&record.title, record.year).await;

        let fields = NewMovie {
            title: record.title.clone(),
            description: Some(record.synopsis.clone()),
            poster,
            trailer_url,
            rating: record.rating,
            runtime: record.runtime.clone(),
            year: record.year,
        };

        match catalog::create_movie(&self.db, fields, record.genres.as_deref()).await {
            Ok(movie) => {
                info!(title = %movie.title, id = movie.id, "imported new catalog entry");
                Ok(Some(movie))
            },
            // Lost an import race: a concurrent request committed this title
            // first and the slug collided. The entry exists now, use it.
            Err(err) if catalog::is_unique_violation(&err) => {
                debug!(title = %record.title, "duplicate import detected, re-resolving");
                catalog::resolve_title(&self.db, &record.title).await.map_err(Into::into)
            },
            Err(err) => Err(err.into()),
        }
    }
}

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use filmoteca::{
    assets::AssetStore,
    error::AppResult,
    llm::{LlmError, SuggestionModel},
    models::{EraFilter, Suggestion, SuggestionList},
    omdb::{MetadataOutcome, MetadataProvider, NO_SYNOPSIS},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub async fn test_db() -> DatabaseConnection {
    // A single pooled connection keeps the whole test on one in-memory db.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.min_connections(1).max_connections(1);
    let db = Database::connect(opts).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// Asset store pointed at an unroutable search host so trailer lookups fail
/// fast and nothing leaves the process.
pub fn offline_assets(uploads_dir: &std::path::Path) -> Arc<AssetStore> {
    Arc::new(AssetStore::new(
        reqwest::Client::new(),
        uploads_dir.to_path_buf(),
        Duration::from_millis(200),
        "http://127.0.0.1:1".to_string(),
    ))
}

/// Canned model reply; records the catalog/seen context it was given.
pub struct StubModel {
    pub reply: SuggestionList,
    pub catalog_seen_by_prompt: Mutex<Vec<String>>,
}

impl StubModel {
    pub fn suggesting(titles: &[&str]) -> Self {
        let reply = SuggestionList {
            top_picks: titles
                .iter()
                .map(|t| Suggestion { title: Some(t.to_string()), reason: None })
                .collect(),
            also_like: Vec::new(),
        };
        Self { reply, catalog_seen_by_prompt: Mutex::new(Vec::new()) }
    }
}

#[async_trait::async_trait]
impl SuggestionModel for StubModel {
    async fn suggest(
        &self,
        _narrative: &str,
        _era: EraFilter,
        catalog: &[String],
        _seen: &[String],
    ) -> Result<SuggestionList, LlmError> {
        *self.catalog_seen_by_prompt.lock().unwrap() = catalog.to_vec();
        Ok(self.reply.clone())
    }
}

/// Programmable metadata provider: known titles resolve, `failing` titles
/// simulate transport failure, everything else is a provider miss.
#[derive(Default)]
pub struct StubMetadata {
    pub records: HashMap<String, filmoteca::omdb::MetadataRecord>,
    pub failing: Vec<String>,
}

impl StubMetadata {
    pub fn with_record(mut self, title: &str, year: i32, genres: &str) -> Self {
        self.records.insert(
            title.to_string(),
            filmoteca::omdb::MetadataRecord {
                title: title.to_string(),
                year: Some(year),
                synopsis: NO_SYNOPSIS.to_string(),
                poster_url: None,
                genres: Some(genres.to_string()),
                rating: 7.0,
                runtime: Some("120 min".to_string()),
            },
        );
        self
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing.push(title.to_string());
        self
    }
}

#[async_trait::async_trait]
impl MetadataProvider for StubMetadata {
    async fn fetch(&self, title: &str) -> AppResult<MetadataOutcome> {
        if self.failing.iter().any(|t| t == title) {
            return Err(anyhow::anyhow!("simulated transport failure").into());
        }
        Ok(self
            .records
            .get(title)
            .cloned()
            .map(MetadataOutcome::Found)
            .unwrap_or(MetadataOutcome::NotFound))
    }
}

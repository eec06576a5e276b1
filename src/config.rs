use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub omdb_rps: u32,
    pub groq_api_key: String,
    pub groq_base_url: String,
    pub groq_model: String,
    pub video_search_base_url: String,
    pub uploads_dir: PathBuf,
    /// Per-call timeout for metadata, poster and trailer fetches.
    pub fetch_timeout_secs: u64,
    pub max_concurrent: usize,
    pub catalog_prompt_limit: u64,
    pub seen_prompt_window: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://filmoteca.db?mode=rwc".to_string());

        let omdb_api_key = std::env::var("OMDB_API_KEY").unwrap_or_else(|_| "".to_string());
        let omdb_base_url = std::env::var("OMDB_BASE_URL")
            .unwrap_or_else(|_| "https://www.omdbapi.com".to_string());

        let omdb_rps: u32 =
            std::env::var("OMDB_RPS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let groq_api_key = std::env::var("GROQ_API_KEY").unwrap_or_else(|_| "".to_string());
        let groq_base_url = std::env::var("GROQ_BASE_URL")
            .unwrap_or_else(|_| "https://api.groq.com/openai/v1".to_string());
        let groq_model = std::env::var("GROQ_MODEL")
            .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());

        let video_search_base_url = std::env::var("VIDEO_SEARCH_BASE_URL")
            .unwrap_or_else(|_| "https://www.youtube.com".to_string());

        let uploads_dir: PathBuf = std::env::var("UPLOADS_DIR")
            .unwrap_or_else(|_| "static/uploads".to_string())
            .into();

        let fetch_timeout_secs: u64 =
            std::env::var("FETCH_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok()).unwrap_or(5);

        let max_concurrent: usize =
            std::env::var("MAX_CONCURRENT_IMPORTS").ok().and_then(|s| s.parse().ok()).unwrap_or(4);

        let catalog_prompt_limit: u64 =
            std::env::var("CATALOG_PROMPT_LIMIT").ok().and_then(|s| s.parse().ok()).unwrap_or(50);

        let seen_prompt_window: u64 =
            std::env::var("SEEN_PROMPT_WINDOW").ok().and_then(|s| s.parse().ok()).unwrap_or(100);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            omdb_api_key,
            omdb_base_url,
            omdb_rps,
            groq_api_key,
            groq_base_url,
            groq_model,
            video_search_base_url,
            uploads_dir,
            fetch_timeout_secs,
            max_concurrent,
            catalog_prompt_limit,
            seen_prompt_window,
        })
    }
}

use std::{sync::Arc, time::Duration};

use filmoteca::{
    AppState, assets::AssetStore, concierge::Concierge, config::Config, db, llm::GroqClient,
    omdb::OmdbClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filmoteca=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("Mozilla/5.0 (compatible; filmoteca/0.1)")
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;

    let fetch_timeout = Duration::from_secs(config.fetch_timeout_secs);
    let metadata = Arc::new(OmdbClient::new(
        http.clone(),
        config.omdb_api_key.clone(),
        config.omdb_base_url.clone(),
        config.omdb_rps,
        fetch_timeout,
    ));
    let model = Arc::new(GroqClient::new(
        http.clone(),
        config.groq_api_key.clone(),
        config.groq_base_url.clone(),
        config.groq_model.clone(),
    ));
    let assets = Arc::new(AssetStore::new(
        http,
        config.uploads_dir.clone(),
        fetch_timeout,
        config.video_search_base_url.clone(),
    ));

    let concierge = Arc::new(Concierge::new(
        db,
        model,
        metadata,
        assets,
        config.max_concurrent,
        config.catalog_prompt_limit,
        config.seen_prompt_window as usize,
    ));

    let state = AppState { config: config.clone(), concierge };
    let app = filmoteca::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

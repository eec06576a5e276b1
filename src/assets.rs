use std::{path::PathBuf, time::Duration};

use scraper::{Html, Selector};
use tracing::debug;

/// Why a poster could not be stored. Callers only branch on success today,
/// but the reason stays distinguishable for diagnosis.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("provider has no image")]
    NoImage,

    #[error("unusable source url: {0}")]
    BadUrl(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

pub struct AssetStore {
    http: reqwest::Client,
    uploads_dir: PathBuf,
    timeout: Duration,
    search_base_url: String,
}

impl AssetStore {
    pub fn new(
        http: reqwest::Client,
        uploads_dir: PathBuf,
        timeout: Duration,
        search_base_url: String,
    ) -> Self {
        Self { http, uploads_dir, timeout, search_base_url }
    }

    /// Downloads a poster and persists it under the uploads dir with a
    /// collision-resistant name. Returns the relative reference path.
    pub async fn download_poster(&self, url: Option<&str>) -> Result<String, AssetError> {
        let url = url.ok_or(AssetError::NoImage)?;
        if url == "N/A" {
            return Err(AssetError::NoImage);
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AssetError::BadUrl(url.to_string()));
        }

        let resp = self.http.get(url).timeout(self.timeout).send().await?;
        if resp.status() != reqwest::StatusCode::OK {
            return Err(AssetError::Status(resp.status()));
        }
        let bytes = resp.bytes().await?;

        let filename = format!("{}.{}", uuid::Uuid::new_v4().simple(), file_extension(url));
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::write(self.uploads_dir.join(&filename), &bytes).await?;

        Ok(format!("uploads/{filename}"))
    }

    /// Best-effort trailer link resolution against video search. Tier one
    /// scans the results page for the first embedded video id; tier two
    /// falls back to parsing anchor tags out of the HTML. Total failure
    /// yields `None`, never an error.
    pub async fn find_trailer(&self, title: &str, year: Option<i32>) -> Option<String> {
        let query = match year {
            Some(y) => format!("{title} {y} trailer sub español"),
            None => format!("{title} trailer sub español"),
        };
        let url = format!(
            "{}/results?search_query={}",
            self.search_base_url.trim_end_matches('/'),
            urlencoding::encode(&query)
        );

        let fetched = async {
            self.http.get(&url).timeout(self.timeout).send().await?.error_for_status()?.text().await
        }
        .await;

        let html = match fetched {
            Ok(html) => html,
            Err(err) => {
                debug!(title = %title, error = %err, "trailer search failed");
                return None;
            },
        };

        if let Some(id) = extract_video_id(&html) {
            return Some(watch_url(&id));
        }
        scrape_watch_link(&html)
    }
}

/// Extension token from the URL path, defaulting to jpg when absent or
/// implausibly long.
fn file_extension(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    let ext = path
        .rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .unwrap_or("");

    if ext.is_empty() || ext.len() > 4 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        "jpg"
    } else {
        ext
    }
}

fn extract_video_id(html: &str) -> Option<String> {
    let marker = "\"videoId\":\"";
    let start = html.find(marker)? + marker.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    let id = &rest[..end];
    (!id.is_empty()).then(|| id.to_string())
}

fn scrape_watch_link(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("a[href*='/watch?v=']").ok()?;
    let href = doc.select(&selector).next()?.value().attr("href")?;
    let id = href.split("v=").nth(1)?.split('&').next()?;
    (!id.is_empty()).then(|| watch_url(id))
}

fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &std::path::Path) -> AssetStore {
        AssetStore::new(
            reqwest::Client::new(),
            dir.to_path_buf(),
            Duration::from_secs(1),
            "http://127.0.0.1:1".to_string(),
        )
    }

    #[test]
    fn extension_derivation() {
        assert_eq!(file_extension("https://x/y/poster.png"), "png");
        assert_eq!(file_extension("https://x/y/poster.jpg?v=123"), "jpg");
        assert_eq!(file_extension("https://x/y/poster"), "jpg");
        // Not a real extension token, force jpg.
        assert_eq!(file_extension("https://x/y/poster.somethinglong"), "jpg");
        assert_eq!(file_extension("https://x/y.z/poster"), "jpg");
    }

    #[test]
    fn video_id_extraction_from_results_blob() {
        let html = r#"<script>var ytInitialData = {"contents":[{"videoRenderer":{"videoId":"dQw4w9WgXcQ"}}]};</script>"#;
        assert_eq!(extract_video_id(html), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(extract_video_id("<html>no ids here</html>"), None);
    }

    #[test]
    fn anchor_fallback_finds_watch_link() {
        let html = r#"<html><body><a href="/watch?v=abc123&pp=x">Trailer</a></body></html>"#;
        assert_eq!(
            scrape_watch_link(html),
            Some("https://www.youtube.com/watch?v=abc123".to_string())
        );
        assert_eq!(scrape_watch_link("<html><a href='/playlist'>x</a></html>"), None);
    }

    #[tokio::test]
    async fn rejected_sources_never_touch_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert!(matches!(store.download_poster(None).await, Err(AssetError::NoImage)));
        assert!(matches!(store.download_poster(Some("N/A")).await, Err(AssetError::NoImage)));
        assert!(matches!(
            store.download_poster(Some("ftp://x/y.jpg")).await,
            Err(AssetError::BadUrl(_))
        ));

        // Nothing was written to the uploads namespace.
        assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    }
}

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::models::{lenient_list, CastMember, MovieDetail, MovieSummary, Paged, VideoRef};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("Missing TMDB_API_KEY")]
    MissingApiKey,

    #[error("TMDB resource not found: {0}")]
    NotFound(String),

    #[error("TMDB returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("TMDB request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TMDB JSON parse failed: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type TmdbResult<T> = Result<T, TmdbError>;

/// Read-only movie metadata source keyed by TMDB id.
#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn fetch_detail(&self, id: u64) -> TmdbResult<MovieDetail>;
    async fn fetch_videos(&self, id: u64) -> TmdbResult<Vec<VideoRef>>;
    async fn fetch_credits(&self, id: u64) -> TmdbResult<Vec<CastMember>>;
    async fn search_movies(&self, query: &str, page: u32) -> TmdbResult<Paged<MovieSummary>>;
    async fn list_trending(&self) -> TmdbResult<Vec<MovieSummary>>;
    async fn list_now_playing(&self, page: u32) -> TmdbResult<Paged<MovieSummary>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        language: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let user_agent = format!("reelview/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: language.into(),
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            config.tmdb_api_key.clone(),
            config.tmdb_base_url.clone(),
            config.tmdb_language.clone(),
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self, path: &str, extra: &str) -> TmdbResult<String> {
        let api_key = self.api_key.as_deref().ok_or(TmdbError::MissingApiKey)?;
        let mut url = format!(
            "{}{path}?api_key={}&language={}",
            self.base_url,
            urlencoding::encode(api_key),
            urlencoding::encode(&self.language)
        );
        if !extra.is_empty() {
            url.push('&');
            url.push_str(extra);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, extra: &str) -> TmdbResult<T> {
        let url = self.url(path, extra)?;
        debug!(path = %path, "TMDB request");
        let res = self.client.get(&url).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if status == StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(TmdbError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Deserialize)]
struct Videos {
    #[serde(default, deserialize_with = "lenient_list")]
    results: Vec<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default, deserialize_with = "lenient_list")]
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct Trending {
    #[serde(default, deserialize_with = "lenient_list")]
    results: Vec<MovieSummary>,
}

#[async_trait]
impl MovieProvider for TmdbClient {
    async fn fetch_detail(&self, id: u64) -> TmdbResult<MovieDetail> {
        self.get_json(&format!("/movie/{id}"), "").await
    }

    async fn fetch_videos(&self, id: u64) -> TmdbResult<Vec<VideoRef>> {
        let videos: Videos = self.get_json(&format!("/movie/{id}/videos"), "").await?;
        Ok(videos.results)
    }

    async fn fetch_credits(&self, id: u64) -> TmdbResult<Vec<CastMember>> {
        let credits: Credits = self.get_json(&format!("/movie/{id}/credits"), "").await?;
        Ok(credits.cast)
    }

    async fn search_movies(&self, query: &str, page: u32) -> TmdbResult<Paged<MovieSummary>> {
        let extra = format!(
            "include_adult=false&page={page}&query={}",
            urlencoding::encode(query)
        );
        self.get_json("/search/movie", &extra).await
    }

    async fn list_trending(&self) -> TmdbResult<Vec<MovieSummary>> {
        let trending: Trending = self.get_json("/trending/movie/week", "").await?;
        Ok(trending.results)
    }

    async fn list_now_playing(&self, page: u32) -> TmdbResult<Paged<MovieSummary>> {
        self.get_json("/movie/now_playing", &format!("page={page}"))
            .await
    }
}

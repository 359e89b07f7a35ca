use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::favorites::{self, FavoritesStore, FavoritesView, FileFavorites};
use crate::models::{AggregatedMovieView, MovieCard, MovieSummary, Paged};
use crate::movies::{self, HomeView};
use crate::tmdb::{MovieProvider, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MovieProvider>,
    pub favorites: Arc<dyn FavoritesStore>,
    pub cast_limit: usize,
    pub batch_concurrency: usize,
}

impl AppState {
    pub fn new(provider: Arc<dyn MovieProvider>, favorites: Arc<dyn FavoritesStore>) -> Self {
        Self {
            provider,
            favorites,
            cast_limit: crate::config::DEFAULT_CAST_LIMIT,
            batch_concurrency: crate::config::DEFAULT_BATCH_CONCURRENCY,
        }
    }
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb = TmdbClient::from_config(&config)?;
    if !tmdb.has_api_key() {
        warn!("TMDB_API_KEY is not set; movie routes will answer with a configuration error");
    }
    info!("Favorites stored at {}", config.favorites_path.display());

    let state = AppState {
        provider: Arc::new(tmdb),
        favorites: Arc::new(FileFavorites::new(config.favorites_path.clone())),
        cast_limit: config.cast_limit,
        batch_concurrency: config.batch_concurrency,
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr = config.socket_addr()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/tmdb/movie", get(movie))
        .route("/api/tmdb/search", get(search))
        .route("/api/tmdb/new-releases", get(new_releases))
        .route("/api/tmdb/trending", get(trending))
        .route("/api/home", get(home))
        .route("/api/search", get(search_rows))
        .route("/api/favorites", get(favorite_list))
        .route("/api/favorites/ids", get(favorite_ids))
        .route("/api/favorites/:id", post(toggle_favorite))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
struct MovieQuery {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    query: Option<String>,
    q: Option<String>,
    page: Option<String>,
}

impl SearchQuery {
    fn text(&self) -> &str {
        self.query
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.q.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

fn parse_id(raw: Option<&str>) -> AppResult<u64> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidInput("missing id".to_string()))?;
    raw.parse()
        .map_err(|_| AppError::InvalidInput(format!("invalid id '{}'", raw)))
}

fn parse_page(raw: Option<&str>) -> AppResult<u32> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(1),
        Some(p) => p
            .parse::<u32>()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| AppError::InvalidInput(format!("invalid page '{}'", p))),
    }
}

async fn movie(
    State(state): State<AppState>,
    Query(params): Query<MovieQuery>,
) -> AppResult<Json<AggregatedMovieView>> {
    let id = parse_id(params.id.as_deref())?;
    debug!(movie_id = id, "Movie detail requested");
    let view = movies::aggregate(state.provider.as_ref(), id, state.cast_limit).await?;
    Ok(Json(view))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Paged<MovieSummary>>> {
    let page = parse_page(params.page.as_deref())?;
    let results = movies::search(state.provider.as_ref(), params.text(), page).await?;
    Ok(Json(results))
}

async fn search_rows(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Paged<MovieCard>>> {
    let page = parse_page(params.page.as_deref())?;
    let rows = movies::search_with_trailers(
        state.provider.as_ref(),
        params.text(),
        page,
        state.batch_concurrency,
    )
    .await?;
    Ok(Json(rows))
}

async fn new_releases(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Paged<MovieSummary>>> {
    let page = parse_page(params.page.as_deref())?;
    Ok(Json(state.provider.list_now_playing(page).await?))
}

async fn trending(State(state): State<AppState>) -> AppResult<Json<Vec<MovieSummary>>> {
    Ok(Json(state.provider.list_trending().await?))
}

async fn home(State(state): State<AppState>) -> AppResult<Json<HomeView>> {
    Ok(Json(movies::home(state.provider.as_ref()).await?))
}

async fn favorite_list(State(state): State<AppState>) -> AppResult<Json<FavoritesView>> {
    let view = favorites::favorite_cards(
        state.provider.as_ref(),
        state.favorites.as_ref(),
        state.batch_concurrency,
    )
    .await?;
    if !view.dropped.is_empty() {
        warn!("Favorites unavailable upstream: {:?}", view.dropped);
    }
    Ok(Json(view))
}

async fn favorite_ids(State(state): State<AppState>) -> AppResult<Json<Vec<u64>>> {
    Ok(Json(state.favorites.get().await?))
}

#[derive(Debug, Serialize)]
struct ToggleResponse {
    id: u64,
    favorite: bool,
}

async fn toggle_favorite(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<ToggleResponse>> {
    let id = parse_id(Some(raw_id.as_str()))?;
    let favorite = state.favorites.toggle(id).await?;
    Ok(Json(ToggleResponse { id, favorite }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}

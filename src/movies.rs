use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::future::Future;
use tracing::{debug, warn};

use crate::models::{AggregatedMovieView, MovieCard, MovieDetail, MovieSummary, Paged};
use crate::tmdb::{MovieProvider, TmdbError, TmdbResult};
use crate::trailer::trailer_key;

/// Outcome of one item in a fan-out.
#[derive(Debug)]
pub enum Settled<I, T, E = TmdbError> {
    Ok(I, T),
    Failed(I, E),
}

/// Runs `f` for every item with at most `limit` in flight and waits for all of them.
///
/// Results come back in input order, each tagged with its item.
pub async fn join_all<I, T, E, F, Fut>(items: Vec<I>, limit: usize, f: F) -> Vec<Settled<I, T, E>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    stream::iter(items.into_iter().map(|item| {
        let fut = f(item.clone());
        async move {
            match fut.await {
                Ok(value) => Settled::Ok(item, value),
                Err(err) => Settled::Failed(item, err),
            }
        }
    }))
    .buffered(limit.max(1))
    .collect()
    .await
}

/// Detail page view. A detail failure fails the whole view; missing videos or credits
/// only degrade it.
pub async fn aggregate(
    provider: &dyn MovieProvider,
    id: u64,
    cast_limit: usize,
) -> TmdbResult<AggregatedMovieView> {
    let (detail, videos, credits) = tokio::join!(
        provider.fetch_detail(id),
        provider.fetch_videos(id),
        provider.fetch_credits(id),
    );
    let detail = detail?;

    let trailer_key = match videos {
        Ok(videos) => trailer_key(&videos),
        Err(e) => {
            warn!("Videos unavailable for movie {}: {}", id, e);
            None
        }
    };
    let cast = match credits {
        Ok(mut cast) => {
            cast.truncate(cast_limit);
            cast
        }
        Err(e) => {
            warn!("Credits unavailable for movie {}: {}", id, e);
            Vec::new()
        }
    };

    debug!(movie_id = id, trailer = ?trailer_key, cast = cast.len(), "Aggregated movie");
    Ok(AggregatedMovieView {
        detail,
        trailer_key,
        cast,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieWithTrailer {
    pub detail: MovieDetail,
    pub trailer_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchOutcome {
    pub items: Vec<MovieWithTrailer>,
    pub dropped: Vec<u64>,
}

async fn detail_with_trailer(provider: &dyn MovieProvider, id: u64) -> TmdbResult<MovieWithTrailer> {
    let (detail, videos) = tokio::join!(provider.fetch_detail(id), provider.fetch_videos(id));
    let detail = detail?;
    let trailer_key = match videos {
        Ok(videos) => trailer_key(&videos),
        Err(e) => {
            debug!("Videos unavailable for movie {}: {}", id, e);
            None
        }
    };
    Ok(MovieWithTrailer {
        detail,
        trailer_key,
    })
}

/// Best-effort join over many ids: ids whose detail cannot be fetched are dropped and
/// reported, the rest keep their relative order.
pub async fn batch_join(provider: &dyn MovieProvider, ids: &[u64], limit: usize) -> BatchOutcome {
    let settled = join_all(ids.to_vec(), limit, |id| detail_with_trailer(provider, id)).await;

    let mut outcome = BatchOutcome::default();
    for entry in settled {
        match entry {
            Settled::Ok(_, item) => outcome.items.push(item),
            Settled::Failed(id, e) => {
                warn!("Dropping movie {} from batch: {}", id, e);
                outcome.dropped.push(id);
            }
        }
    }
    outcome
}

/// Blank queries short-circuit to an empty first page without touching the provider.
pub async fn search(
    provider: &dyn MovieProvider,
    query: &str,
    page: u32,
) -> TmdbResult<Paged<MovieSummary>> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Paged::empty());
    }
    provider.search_movies(query, page).await
}

pub async fn search_with_trailers(
    provider: &dyn MovieProvider,
    query: &str,
    page: u32,
    limit: usize,
) -> TmdbResult<Paged<MovieCard>> {
    let found = search(provider, query, page).await?;
    let ids: Vec<u64> = found.results.iter().map(|m| m.id).collect();
    let settled = join_all(ids, limit, |id| provider.fetch_videos(id)).await;

    let keys: Vec<Option<String>> = settled
        .into_iter()
        .map(|entry| match entry {
            Settled::Ok(_, videos) => trailer_key(&videos),
            Settled::Failed(id, e) => {
                debug!("No trailer lookup for movie {}: {}", id, e);
                None
            }
        })
        .collect();

    let Paged {
        results,
        page,
        total_pages,
    } = found;
    Ok(Paged {
        results: results
            .iter()
            .zip(keys)
            .map(|(summary, key)| MovieCard::from_summary(summary, key))
            .collect(),
        page,
        total_pages,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeView {
    pub featured: Option<MovieSummary>,
    pub trending: Vec<MovieSummary>,
    pub now_playing: Paged<MovieSummary>,
}

pub const TRENDING_ROW_LEN: usize = 12;

/// Landing page: the top trending movie is featured, the next dozen form the row.
pub async fn home(provider: &dyn MovieProvider) -> TmdbResult<HomeView> {
    let (trending, now_playing) =
        tokio::try_join!(provider.list_trending(), provider.list_now_playing(1))?;
    let mut trending = trending.into_iter();
    let featured = trending.next();
    Ok(HomeView {
        featured,
        trending: trending.take(TRENDING_ROW_LEN).collect(),
        now_playing,
    })
}

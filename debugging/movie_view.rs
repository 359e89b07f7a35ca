//! Fetch a movie through the aggregator and print the view the detail route would serve.
//! Usage:
//!   cargo run --bin movie_view -- <tmdb_id> [search query...]
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use reelview::config::Config;
use reelview::movies;
use reelview::tmdb::TmdbClient;
use reelview::trailer::watch_url;
use serde_json::json;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin movie_view -- <tmdb_id> [search query...]");
        std::process::exit(1);
    }

    let id: u64 = args[1].parse().context("tmdb_id must be an integer")?;
    let config = Config::from_env()?;
    let client = TmdbClient::from_config(&config)?;

    let view = movies::aggregate(&client, id, config.cast_limit).await?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    if let Some(key) = view.trailer_key.as_deref() {
        println!("Trailer: {}", watch_url(key));
    }

    if args.len() > 2 {
        let query = args[2..].join(" ");
        let rows =
            movies::search_with_trailers(&client, &query, 1, config.batch_concurrency).await?;
        let summary: Vec<_> = rows
            .results
            .iter()
            .map(|r| json!({ "id": r.id, "title": r.title, "trailer": r.trailer_key }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}

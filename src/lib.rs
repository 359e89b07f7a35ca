pub mod app;
pub mod config;
pub mod error;
pub mod favorites;
pub mod models;
pub mod movies;
pub mod tmdb;
pub mod trailer;

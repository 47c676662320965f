pub mod app_state;
pub mod archive;
pub mod auth;
pub mod bookmarks;
pub mod config;
pub mod entities;
pub mod extractor;
pub mod fetcher;
pub mod health;
pub mod importer;
pub mod middleware;
pub mod openapi;
pub mod passwords;
pub mod repositories;
pub mod response;
pub mod router;
pub mod tags;
pub mod telemetry;

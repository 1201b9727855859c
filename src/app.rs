//! Application state and command dispatch
//!
//! `App` owns the TMDB client, the shared response cache and the favorites
//! store, and turns each CLI command into the text (or JSON) to print.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{ResponseCache, StorageError};
use crate::cli::{BrowseArgs, CacheAction, Command, FavoritesAction};
use crate::config::ConfigError;
use crate::data::{ApiError, BrowseRequest, MoviePage, ReqwestTransport, TmdbClient, Transport};
use crate::favorites::FavoritesStore;
use crate::render;

/// Errors surfaced to the user by a command
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to save favorites: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Movie {0} is not in favorites")]
    NotFavorite(u64),

    #[error("Failed to encode output: {0}")]
    Output(#[source] serde_json::Error),
}

/// Main application state
pub struct App<T = ReqwestTransport> {
    tmdb: TmdbClient<T>,
    cache: Arc<ResponseCache>,
    favorites: FavoritesStore,
    /// Print JSON instead of text
    json: bool,
    /// Fetch the page after a listing into the cache
    prefetch: bool,
}

impl<T: Transport> App<T> {
    /// Creates the app; `tmdb` must share `cache` with this app
    pub fn new(tmdb: TmdbClient<T>, favorites: FavoritesStore) -> Self {
        let cache = tmdb.api().cache().clone();
        Self {
            tmdb,
            cache,
            favorites,
            json: false,
            prefetch: false,
        }
    }

    /// Switches output to pretty-printed JSON
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// After each listing, also fetch the next page so it is served from cache
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    /// Runs one command and returns its output
    pub async fn run(&mut self, command: &Command) -> Result<String, AppError> {
        match command {
            Command::Browse(args) => self.browse(args).await,
            Command::Search { query, page } => self.search(query, *page).await,
            Command::Details { id } => {
                let details = self.tmdb.details(*id).await?;
                self.output(&details, |app| {
                    render::render_details(&details, app.favorites.contains(details.id))
                })
            }
            Command::Genres => {
                let genres = self.tmdb.genres().await?;
                self.output(&genres, |_| render::render_genres(&genres.genres))
            }
            Command::Favorites { action } => self.run_favorites(action).await,
            Command::Cache { action } => Ok(self.run_cache(*action)),
        }
    }

    async fn browse(&self, args: &BrowseArgs) -> Result<String, AppError> {
        let request = args.to_request();
        let page = self.tmdb.browse(&request).await?;

        if let Some(next) = self.next_page(request.page.max(1), &page) {
            let next_request = BrowseRequest { page: next, ..request };
            log_prefetch(next, self.tmdb.browse(&next_request).await);
        }

        self.output(&page, |app| render::render_page(&page, |id| app.favorites.contains(id)))
    }

    async fn search(&self, query: &str, current: u32) -> Result<String, AppError> {
        let page = self.tmdb.search(query, current).await?;

        if let Some(next) = self.next_page(current, &page) {
            log_prefetch(next, self.tmdb.search(query, next).await);
        }

        self.output(&page, |app| render::render_page(&page, |id| app.favorites.contains(id)))
    }

    /// Page to prefetch after `current`, if prefetching and one exists
    fn next_page(&self, current: u32, page: &MoviePage) -> Option<u32> {
        (self.prefetch && current < page.total_pages).then(|| current + 1)
    }

    async fn run_favorites(&mut self, action: &FavoritesAction) -> Result<String, AppError> {
        match action {
            FavoritesAction::Add { id } => {
                let movie = self.tmdb.details(*id).await?.to_movie();
                let message = format!("Added \"{}\" to favorites", movie.title);
                self.favorites.add(movie)?;
                Ok(message)
            }
            FavoritesAction::Remove { id } => match self.favorites.remove(*id)? {
                Some(movie) => Ok(format!("Removed \"{}\" from favorites", movie.title)),
                None => Err(AppError::NotFavorite(*id)),
            },
            FavoritesAction::List { refresh } => {
                if *refresh {
                    self.refresh_favorites().await?;
                }
                let movies: Vec<_> = self.favorites.list().collect();
                self.output(&movies, |_| render::render_favorites(movies.iter().copied()))
            }
            FavoritesAction::Clear => {
                self.favorites.clear()?;
                Ok("Favorites cleared".to_string())
            }
        }
    }

    /// Re-fetches every favorite concurrently, keeping old data on failure
    async fn refresh_favorites(&mut self) -> Result<(), AppError> {
        let ids: Vec<u64> = self.favorites.list().map(|m| m.id).collect();

        let results = futures::future::join_all(ids.iter().map(|id| self.tmdb.details(*id))).await;

        let mut refreshed = Vec::with_capacity(ids.len());
        for (id, result) in ids.iter().zip(results) {
            match result {
                Ok(details) => refreshed.push(details.to_movie()),
                Err(e) => warn!(id, error = %e, "failed to refresh favorite"),
            }
        }

        let updated = self.favorites.refresh(refreshed)?;
        info!(updated, total = ids.len(), "refreshed favorites");
        Ok(())
    }

    fn run_cache(&self, action: CacheAction) -> String {
        match action {
            CacheAction::Clear => {
                self.cache.clear();
                "Cache cleared".to_string()
            }
            CacheAction::Stats => format!(
                "{} cached responses (TTL {} min)",
                self.cache.len(),
                self.cache.ttl().as_secs() / 60
            ),
        }
    }

    /// Serializes `value` in JSON mode, otherwise renders text
    fn output<V: Serialize>(&self, value: &V, text: impl FnOnce(&Self) -> String) -> Result<String, AppError> {
        if self.json {
            serde_json::to_string_pretty(value).map_err(AppError::Output)
        } else {
            Ok(text(self))
        }
    }
}

/// Prefetch failures only cost a later cache miss
fn log_prefetch(next: u32, result: Result<MoviePage, ApiError>) {
    match result {
        Ok(_) => debug!(page = next, "prefetched next page"),
        Err(e) => debug!(page = next, error = %e, "prefetch failed"),
    }
}

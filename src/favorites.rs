//! Favorite movies, persisted across sessions
//!
//! Favorites are kept as one JSON object mapping movie id to the movie's
//! listing data, stored under a single key of a durable key-value storage.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cache::{KvStorage, StorageError};
use crate::data::Movie;

/// Storage key holding the favorites map
pub const FAVORITES_KEY: &str = "moviex_favorites_v1";

/// The user's favorite movies
pub struct FavoritesStore {
    storage: Box<dyn KvStorage>,
    favorites: BTreeMap<u64, Movie>,
}

impl FavoritesStore {
    /// Loads favorites from `storage`
    ///
    /// Missing or unreadable data starts an empty list rather than failing.
    pub fn load(storage: impl KvStorage + 'static) -> Self {
        let favorites = match storage.get_item(FAVORITES_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                debug!(error = %e, "discarding unreadable favorites");
                BTreeMap::new()
            }),
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                debug!(error = %e, "favorites storage unreadable");
                BTreeMap::new()
            }
        };

        Self {
            storage: Box::new(storage),
            favorites,
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.favorites.contains_key(&id)
    }

    pub fn get(&self, id: u64) -> Option<&Movie> {
        self.favorites.get(&id)
    }

    /// Favorites ordered by movie id
    pub fn list(&self) -> impl Iterator<Item = &Movie> {
        self.favorites.values()
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    /// Adds or replaces a favorite
    pub fn add(&mut self, movie: Movie) -> Result<(), StorageError> {
        self.favorites.insert(movie.id, movie);
        self.save()
    }

    /// Removes a favorite, returning it if it was present
    pub fn remove(&mut self, id: u64) -> Result<Option<Movie>, StorageError> {
        let removed = self.favorites.remove(&id);
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    /// Adds the movie if absent, removes it if present
    ///
    /// # Returns
    /// * `Ok(true)` if the movie is now a favorite
    /// * `Ok(false)` if it was removed
    pub fn toggle(&mut self, movie: Movie) -> Result<bool, StorageError> {
        if self.contains(movie.id) {
            self.remove(movie.id)?;
            Ok(false)
        } else {
            self.add(movie)?;
            Ok(true)
        }
    }

    /// Replaces the stored data of existing favorites
    ///
    /// Movies that are not favorites are ignored. Returns how many were updated.
    pub fn refresh(&mut self, movies: impl IntoIterator<Item = Movie>) -> Result<usize, StorageError> {
        let mut updated = 0;
        for movie in movies {
            if let Some(existing) = self.favorites.get_mut(&movie.id) {
                *existing = movie;
                updated += 1;
            }
        }
        if updated > 0 {
            self.save()?;
        }
        Ok(updated)
    }

    /// Removes every favorite
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.favorites.clear();
        self.save()
    }

    fn save(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.favorites)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        self.storage.set_item(FAVORITES_KEY, &json)
    }
}

//! Command-line interface parsing for the movie explorer
//!
//! This module handles parsing of CLI arguments using clap: global options
//! for the API, the response cache and output, and one subcommand per
//! explorer action.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use thiserror::Error;

use crate::data::{BrowseRequest, DiscoverFilters, ListMode, SortBy};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The search query is empty or only whitespace
    #[error("Search query must not be empty")]
    EmptyQuery,
}

/// Movie explorer - browse, search and bookmark TMDB movies
#[derive(Parser, Debug)]
#[command(name = "moviex")]
#[command(about = "Browse, search and bookmark TMDB movies from the terminal")]
#[command(version)]
pub struct Cli {
    /// TMDB API key
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Base URL of the TMDB API
    #[arg(long, env = "MOVIEX_BASE_URL", value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// How long cached responses stay fresh, in minutes
    #[arg(long, value_name = "MINUTES", default_value_t = 60, global = true)]
    pub cache_ttl_mins: u64,

    /// Do not read or write the response cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Directory for cached responses (default: XDG cache directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Directory for favorites (default: XDG data directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Also fetch the next page of a listing into the cache
    #[arg(long, global = true)]
    pub prefetch: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Browse a list, a filtered discovery or search results
    Browse(BrowseArgs),

    /// Search movies by title
    Search {
        /// Title to search for
        #[arg(value_parser = parse_query_arg)]
        query: String,

        /// Result page
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=500))]
        page: u32,
    },

    /// Show details, cast and trailer of a movie
    Details {
        /// TMDB movie id
        id: u64,
    },

    /// List movie genres and their ids
    Genres,

    /// Manage favorite movies
    #[command(name = "fav")]
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Manage the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct BrowseArgs {
    /// Search query; takes precedence over mode and filters
    #[arg(short, long)]
    pub query: Option<String>,

    /// Movie list to browse
    #[arg(short, long, value_enum, default_value_t = ListMode::Popular)]
    pub mode: ListMode,

    /// Only movies of this genre id (see `moviex genres`)
    #[arg(short, long)]
    pub genre: Option<u32>,

    /// Only movies first released in this year
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1874..=2100))]
    pub year: Option<u16>,

    /// Sort order for filtered discovery
    #[arg(short, long, value_enum, default_value_t = SortBy::PopularityDesc)]
    pub sort: SortBy,

    /// Result page
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=500))]
    pub page: u32,
}

impl BrowseArgs {
    pub fn to_request(&self) -> BrowseRequest {
        BrowseRequest {
            query: self.query.clone(),
            mode: self.mode,
            filters: DiscoverFilters {
                genre: self.genre,
                year: self.year,
                sort: self.sort,
            },
            page: self.page,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum FavoritesAction {
    /// Add a movie to favorites
    Add { id: u64 },
    /// Remove a movie from favorites
    Remove { id: u64 },
    /// List favorites
    List {
        /// Re-fetch details of every favorite first
        #[arg(long)]
        refresh: bool,
    },
    /// Remove every favorite
    Clear,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Delete every cached response
    Clear,
    /// Show how many responses are cached
    Stats,
}

impl Command {
    /// Whether the command talks to the API and therefore needs an API key
    pub fn needs_network(&self) -> bool {
        match self {
            Command::Browse(_) | Command::Search { .. } | Command::Details { .. } | Command::Genres => {
                true
            }
            Command::Favorites { action } => matches!(
                action,
                FavoritesAction::Add { .. } | FavoritesAction::List { refresh: true }
            ),
            Command::Cache { .. } => false,
        }
    }
}

/// Parses a search query argument, rejecting blank input
///
/// # Returns
/// * `Ok(String)` with surrounding whitespace trimmed
/// * `Err(CliError::EmptyQuery)` if nothing is left
pub fn parse_query_arg(s: &str) -> Result<String, CliError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyQuery);
    }
    Ok(trimmed.to_string())
}

//! TMDB endpoint client
//!
//! Typed helpers for the TMDB v3 endpoints the explorer uses, all routed
//! through the cached [`ApiClient`].

use clap::ValueEnum;

use super::client::{ApiClient, ApiError, ReqwestTransport, Transport};
use super::{GenreList, MovieDetails, MoviePage};
use crate::cache::QueryParams;

/// Base URL for the TMDB v3 API
pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Language requested for titles and overviews
const LANGUAGE: &str = "en-US";

/// Extra data appended to movie details requests
const DETAILS_APPEND: &str = "credits,videos,images";

/// Curated movie lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ListMode {
    #[default]
    Popular,
    TopRated,
    Upcoming,
    NowPlaying,
    /// Trending this week
    Trending,
    /// Filtered discovery
    Discover,
}

impl ListMode {
    /// Path of the list endpoint for this mode
    ///
    /// `Discover` has no list of its own and maps to the discover endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            ListMode::Popular => "/movie/popular",
            ListMode::TopRated => "/movie/top_rated",
            ListMode::Upcoming => "/movie/upcoming",
            ListMode::NowPlaying => "/movie/now_playing",
            ListMode::Trending => "/trending/movie/week",
            ListMode::Discover => "/discover/movie",
        }
    }
}

/// Sort orders accepted by the discover endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SortBy {
    #[default]
    #[value(name = "popularity.desc")]
    PopularityDesc,
    #[value(name = "popularity.asc")]
    PopularityAsc,
    #[value(name = "vote_average.desc")]
    VoteAverageDesc,
    #[value(name = "vote_average.asc")]
    VoteAverageAsc,
    #[value(name = "primary_release_date.desc")]
    ReleaseDateDesc,
    #[value(name = "primary_release_date.asc")]
    ReleaseDateAsc,
    #[value(name = "revenue.desc")]
    RevenueDesc,
    #[value(name = "title.asc")]
    TitleAsc,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::PopularityDesc => "popularity.desc",
            SortBy::PopularityAsc => "popularity.asc",
            SortBy::VoteAverageDesc => "vote_average.desc",
            SortBy::VoteAverageAsc => "vote_average.asc",
            SortBy::ReleaseDateDesc => "primary_release_date.desc",
            SortBy::ReleaseDateAsc => "primary_release_date.asc",
            SortBy::RevenueDesc => "revenue.desc",
            SortBy::TitleAsc => "title.asc",
        }
    }
}

/// Filters for the discover endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverFilters {
    /// Genre id to restrict results to
    pub genre: Option<u32>,
    /// Primary release year
    pub year: Option<u16>,
    pub sort: SortBy,
}

impl DiscoverFilters {
    /// Whether any filter differs from the unfiltered default
    pub fn is_active(&self) -> bool {
        self.genre.is_some() || self.year.is_some() || self.sort != SortBy::default()
    }
}

/// What to browse: a search, a filtered discovery or a curated list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseRequest {
    pub query: Option<String>,
    pub mode: ListMode,
    pub filters: DiscoverFilters,
    pub page: u32,
}

/// Endpoint a [`BrowseRequest`] resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseSource<'a> {
    Search(&'a str),
    Discover(&'a DiscoverFilters),
    List(ListMode),
}

impl BrowseRequest {
    /// Picks the endpoint for this request
    ///
    /// A non-blank query always searches. Otherwise the discover mode or any
    /// active filter discovers, and the remaining modes read their list.
    pub fn source(&self) -> BrowseSource<'_> {
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            return BrowseSource::Search(query);
        }
        if self.mode == ListMode::Discover || self.filters.is_active() {
            return BrowseSource::Discover(&self.filters);
        }
        BrowseSource::List(self.mode)
    }
}

/// Client for the TMDB endpoints used by the explorer
#[derive(Debug)]
pub struct TmdbClient<T = ReqwestTransport> {
    api: ApiClient<T>,
}

impl<T: Transport> TmdbClient<T> {
    pub fn new(api: ApiClient<T>) -> Self {
        Self { api }
    }

    /// The underlying cached fetch wrapper
    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    /// Fetch the list of movie genres
    pub async fn genres(&self) -> Result<GenreList, ApiError> {
        let params = QueryParams::new().set("language", LANGUAGE);
        self.api.fetch("/genre/movie/list", &params).await
    }

    /// Discover movies matching `filters`
    pub async fn discover(&self, filters: &DiscoverFilters, page: u32) -> Result<MoviePage, ApiError> {
        let params = QueryParams::new()
            .set("language", LANGUAGE)
            .set("sort_by", filters.sort.as_str())
            .set("page", page)
            .set_opt("with_genres", filters.genre)
            .set_opt("primary_release_year", filters.year)
            .set("include_adult", false);
        self.api.fetch(ListMode::Discover.path(), &params).await
    }

    /// Search movies by title
    pub async fn search(&self, query: &str, page: u32) -> Result<MoviePage, ApiError> {
        let params = QueryParams::new()
            .set("query", query)
            .set("page", page)
            .set("include_adult", false)
            .set("language", LANGUAGE);
        self.api.fetch("/search/movie", &params).await
    }

    /// Fetch a curated list
    pub async fn list(&self, mode: ListMode, page: u32) -> Result<MoviePage, ApiError> {
        if mode == ListMode::Discover {
            return self.discover(&DiscoverFilters::default(), page).await;
        }

        let mut params = QueryParams::new().set("page", page);
        if mode != ListMode::Trending {
            params = params.set("language", LANGUAGE);
        }
        self.api.fetch(mode.path(), &params).await
    }

    /// Fetch full details, credits and videos of a movie
    pub async fn details(&self, id: u64) -> Result<MovieDetails, ApiError> {
        let params = QueryParams::new()
            .set("append_to_response", DETAILS_APPEND)
            .set("language", LANGUAGE);
        self.api.fetch(&format!("/movie/{}", id), &params).await
    }

    /// Fetch the page a browse request resolves to
    pub async fn browse(&self, request: &BrowseRequest) -> Result<MoviePage, ApiError> {
        let page = request.page.max(1);
        match request.source() {
            BrowseSource::Search(query) => self.search(query, page).await,
            BrowseSource::Discover(filters) => self.discover(filters, page).await,
            BrowseSource::List(mode) => self.list(mode, page).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStorage, ResponseCache, DEFAULT_TTL};
    use crate::data::client::testing::{base_url, StubTransport};
    use std::sync::Arc;

    const PAGE_JSON: &str = r#"{"page":1,"results":[{"id":550,"title":"Fight Club"}],"total_pages":3,"total_results":42}"#;

    fn create_client(stub: StubTransport) -> (TmdbClient<Arc<StubTransport>>, Arc<StubTransport>) {
        let stub = Arc::new(stub);
        let cache = Arc::new(ResponseCache::new(MemoryStorage::new(), DEFAULT_TTL));
        let api = ApiClient::with_transport(stub.clone(), base_url(), cache);
        (TmdbClient::new(api), stub)
    }

    fn query_of(stub: &StubTransport) -> Vec<(String, String)> {
        stub.urls()
            .last()
            .expect("Expected a request")
            .query_pairs()
            .into_owned()
            .collect()
    }

    #[test]
    fn test_blank_query_does_not_search() {
        let request = BrowseRequest {
            query: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(request.source(), BrowseSource::List(ListMode::Popular));
    }

    #[test]
    fn test_query_wins_over_filters() {
        let request = BrowseRequest {
            query: Some(" alien ".to_string()),
            mode: ListMode::Discover,
            filters: DiscoverFilters {
                genre: Some(27),
                ..Default::default()
            },
            page: 1,
        };
        assert_eq!(request.source(), BrowseSource::Search("alien"));
    }

    #[test]
    fn test_active_filters_select_discover() {
        let by_genre = BrowseRequest {
            mode: ListMode::TopRated,
            filters: DiscoverFilters {
                genre: Some(18),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(by_genre.source(), BrowseSource::Discover(_)));

        let by_sort = BrowseRequest {
            filters: DiscoverFilters {
                sort: SortBy::VoteAverageDesc,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(by_sort.source(), BrowseSource::Discover(_)));

        let by_mode = BrowseRequest {
            mode: ListMode::Discover,
            ..Default::default()
        };
        assert!(matches!(by_mode.source(), BrowseSource::Discover(_)));
    }

    #[test]
    fn test_list_mode_paths() {
        assert_eq!(ListMode::Popular.path(), "/movie/popular");
        assert_eq!(ListMode::TopRated.path(), "/movie/top_rated");
        assert_eq!(ListMode::NowPlaying.path(), "/movie/now_playing");
        assert_eq!(ListMode::Trending.path(), "/trending/movie/week");
    }

    #[test]
    fn test_sort_by_value_names_match_api() {
        for sort in SortBy::value_variants() {
            let value = sort.to_possible_value().expect("Every sort has a value");
            assert_eq!(value.get_name(), sort.as_str());
        }
    }

    #[tokio::test]
    async fn test_trending_omits_language() {
        let (client, stub) =
            create_client(StubTransport::new().respond("/trending/movie/week", 200, PAGE_JSON));

        let page = client.list(ListMode::Trending, 2).await.unwrap();

        assert_eq!(page.results[0].id, 550);
        let query = query_of(&stub);
        assert!(query.contains(&("page".to_string(), "2".to_string())));
        assert!(!query.iter().any(|(k, _)| k == "language"));
    }

    #[tokio::test]
    async fn test_discover_sends_filters() {
        let (client, stub) =
            create_client(StubTransport::new().respond("/discover/movie", 200, PAGE_JSON));
        let filters = DiscoverFilters {
            genre: Some(878),
            year: Some(1999),
            sort: SortBy::RevenueDesc,
        };

        client.discover(&filters, 1).await.unwrap();

        let query = query_of(&stub);
        assert!(query.contains(&("with_genres".to_string(), "878".to_string())));
        assert!(query.contains(&("primary_release_year".to_string(), "1999".to_string())));
        assert!(query.contains(&("sort_by".to_string(), "revenue.desc".to_string())));
        assert!(query.contains(&("include_adult".to_string(), "false".to_string())));
    }

    #[tokio::test]
    async fn test_discover_without_filters_omits_them() {
        let (client, stub) =
            create_client(StubTransport::new().respond("/discover/movie", 200, PAGE_JSON));

        client.list(ListMode::Discover, 1).await.unwrap();

        let query = query_of(&stub);
        assert!(!query.iter().any(|(k, _)| k == "with_genres" || k == "primary_release_year"));
    }

    #[tokio::test]
    async fn test_details_appends_credits_and_videos() {
        let (client, stub) = create_client(StubTransport::new().respond(
            "/movie/603",
            200,
            r#"{"id":603,"title":"The Matrix","videos":{"results":[{"key":"k","site":"YouTube","type":"Trailer"}]}}"#,
        ));

        let details = client.details(603).await.unwrap();

        assert_eq!(details.title, "The Matrix");
        assert!(details.trailer().is_some());
        let query = query_of(&stub);
        assert!(query.contains(&(
            "append_to_response".to_string(),
            "credits,videos,images".to_string()
        )));
    }

    #[tokio::test]
    async fn test_browse_search_is_cached_per_query() {
        let (client, stub) =
            create_client(StubTransport::new().respond("/search/movie", 200, PAGE_JSON));
        let request = BrowseRequest {
            query: Some("fight".to_string()),
            page: 0,
            ..Default::default()
        };

        client.browse(&request).await.unwrap();
        client.browse(&request).await.unwrap();
        client.search("club", 1).await.unwrap();

        assert_eq!(stub.calls(), 2);
        let query = query_of(&stub);
        assert!(query.contains(&("query".to_string(), "club".to_string())));
    }

    #[tokio::test]
    async fn test_genres() {
        let (client, _stub) = create_client(StubTransport::new().respond(
            "/genre/movie/list",
            200,
            r#"{"genres":[{"id":28,"name":"Action"},{"id":35,"name":"Comedy"}]}"#,
        ));

        let genres = client.genres().await.unwrap();

        assert_eq!(genres.genres.len(), 2);
        assert_eq!(genres.genres[1].name, "Comedy");
    }

    #[tokio::test]
    async fn test_unknown_movie_is_remote_error() {
        let (client, _stub) = create_client(StubTransport::new());

        let err = client.details(1).await.unwrap_err();

        assert!(matches!(err, ApiError::Remote { status: 404, .. }));
    }
}

//! Plain-text rendering of movie listings, details and favorites

use crate::data::{poster_url, Genre, Movie, MovieDetails, MoviePage, BACKDROP_SIZE};

/// Number of cast members shown in the details view
pub const TOP_CAST: usize = 12;

/// Formats a number with comma thousands separators (1234567 -> "1,234,567")
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn year_or_dash(year: Option<&str>) -> &str {
    year.unwrap_or("—")
}

fn rating(vote_average: Option<f64>) -> String {
    vote_average
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

/// One-line summary: `[★] #id Title (YYYY) • ⭐ 7.3`
pub fn movie_line(movie: &Movie, is_favorite: bool) -> String {
    format!(
        "{} #{} {} ({}) • ⭐ {}",
        if is_favorite { "★" } else { " " },
        movie.id,
        movie.title,
        year_or_dash(movie.year()),
        rating(movie.vote_average)
    )
}

/// Renders a result page, marking movies for which `is_favorite` holds
pub fn render_page(page: &MoviePage, is_favorite: impl Fn(u64) -> bool) -> String {
    let mut lines: Vec<String> = page
        .results
        .iter()
        .map(|m| movie_line(m, is_favorite(m.id)))
        .collect();

    if lines.is_empty() {
        lines.push("No movies found.".to_string());
    }
    lines.push(format!("Page {} of {}", page.page, page.total_pages.max(1)));
    lines.join("\n")
}

/// Renders the details view of a movie
pub fn render_details(details: &MovieDetails, is_favorite: bool) -> String {
    let mut lines = vec![format!(
        "{} ({}){}",
        details.title,
        year_or_dash(details.year()),
        if is_favorite { " ★" } else { "" }
    )];

    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        lines.push(tagline.to_string());
    }
    if let Some(overview) = details.overview.as_deref().filter(|o| !o.is_empty()) {
        lines.push(String::new());
        lines.push(overview.to_string());
    }

    lines.push(String::new());
    lines.push(format!(
        "Runtime: {}",
        details
            .runtime
            .map(|r| format!("{} min", r))
            .unwrap_or_else(|| "—".to_string())
    ));
    lines.push(format!("Genres: {}", genre_names(&details.genres)));
    lines.push(format!(
        "Revenue: {}",
        details
            .revenue
            .filter(|r| *r > 0)
            .map(|r| format!("${}", format_number(r)))
            .unwrap_or_else(|| "—".to_string())
    ));
    lines.push(format!("Rating: {}", rating(details.vote_average)));

    if let Some(poster) = poster_url(details.poster_path.as_deref(), BACKDROP_SIZE) {
        lines.push(format!("Poster: {}", poster));
    }

    let cast = details.top_cast(TOP_CAST);
    if !cast.is_empty() {
        lines.push(String::new());
        lines.push("Top cast:".to_string());
        for member in cast {
            match member.character.as_deref().filter(|c| !c.is_empty()) {
                Some(character) => lines.push(format!("  {} as {}", member.name, character)),
                None => lines.push(format!("  {}", member.name)),
            }
        }
    }

    if let Some(url) = details.trailer().and_then(|v| v.youtube_url()) {
        lines.push(String::new());
        lines.push(format!("Trailer: {}", url));
    }

    lines.join("\n")
}

fn genre_names(genres: &[Genre]) -> String {
    if genres.is_empty() {
        return "—".to_string();
    }
    genres
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the genre list as `id  name` lines
pub fn render_genres(genres: &[Genre]) -> String {
    genres
        .iter()
        .map(|g| format!("{:>6}  {}", g.id, g.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the favorites list
pub fn render_favorites<'a>(movies: impl IntoIterator<Item = &'a Movie>) -> String {
    let lines: Vec<String> = movies.into_iter().map(|m| movie_line(m, true)).collect();
    if lines.is_empty() {
        return "No favorites yet.".to_string();
    }
    lines.join("\n")
}

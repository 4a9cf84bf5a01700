//! Title normalization and similarity scoring.
//!
//! Library titles and TMDB titles are compared through [`title_key`]: accents
//! removed and lowercased, so "Amélie" and "AMELIE" are the same movie.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Trailing " (1999)" style year suffix that Radarr sometimes carries in titles.
static YEAR_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" \(\d{4}\)").expect("valid year suffix pattern"));

/// Remove accents and other combining marks.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Remove " (YYYY)" year suffixes.
pub fn strip_year_suffix(text: &str) -> String {
    YEAR_SUFFIX.replace_all(text, "").into_owned()
}

/// Display name for a library title.
pub fn library_name(title: &str) -> String {
    strip_year_suffix(&strip_diacritics(title))
}

/// Key used for library membership and title comparison.
pub fn title_key(title: &str) -> String {
    strip_diacritics(title).to_lowercase()
}

/// Similarity of two strings on a 0-100 scale.
///
/// Indel ratio: `2 * matching chars / (len(a) + len(b))`, so an inserted
/// character costs less than a substitution.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// English name of an ISO 639-1 language code; unknown codes are returned as-is.
pub fn language_name(code: &str) -> String {
    isolang::Language::from_639_1(code)
        .map(|language| language.to_name().to_string())
        .unwrap_or_else(|| code.to_string())
}

/// TMDB movie genre name for a genre code.
pub fn genre_name(code: u32) -> &'static str {
    match code {
        28 => "Action",
        12 => "Adventure",
        16 => "Animation",
        35 => "Comedy",
        80 => "Crime",
        99 => "Documentary",
        18 => "Drama",
        10751 => "Family",
        14 => "Fantasy",
        36 => "History",
        27 => "Horror",
        10402 => "Music",
        9648 => "Mystery",
        10749 => "Romance",
        878 => "Science Fiction",
        10770 => "TV Movie",
        53 => "Thriller",
        10752 => "War",
        37 => "Western",
        _ => "Unknown",
    }
}

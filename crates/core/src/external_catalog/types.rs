//! Types for recommendation graph responses.

use serde::{Deserialize, Serialize};

/// A TMDB movie search hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbMovie {
    /// TMDB movie ID.
    pub id: u32,
    /// Movie title.
    pub title: String,
    /// Original title (in original language).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
}

impl TmdbMovie {
    /// The four-character year prefix of the release date, if any.
    pub fn release_year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }
}

/// A movie TMDB recommends for some other movie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbCandidate {
    /// TMDB movie ID.
    pub id: u32,
    /// Movie title.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Average vote (0-10).
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    /// ISO 639-1 code of the original language.
    #[serde(default = "default_language")]
    pub original_language: String,
    /// TMDB genre codes.
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Absolute poster URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

impl TmdbCandidate {
    /// The four-character year prefix of the release date, if any.
    pub fn release_year(&self) -> Option<&str> {
        release_year(self.release_date.as_deref())
    }
}

fn default_language() -> String {
    "en".to_string()
}

fn release_year(date: Option<&str>) -> Option<&str> {
    date.and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year() {
        let movie = TmdbMovie {
            id: 27205,
            title: "Inception".to_string(),
            original_title: None,
            release_date: Some("2010-07-15".to_string()),
        };
        assert_eq!(movie.release_year(), Some("2010"));
    }

    #[test]
    fn test_release_year_empty_date() {
        let movie = TmdbMovie {
            id: 1,
            title: "Untitled".to_string(),
            original_title: None,
            release_date: Some(String::new()),
        };
        assert_eq!(movie.release_year(), None);
    }

    #[test]
    fn test_candidate_defaults() {
        let candidate: TmdbCandidate =
            serde_json::from_str(r#"{"id": 5, "title": "Sparse"}"#).unwrap();
        assert_eq!(candidate.vote_average, 0.0);
        assert_eq!(candidate.vote_count, 0);
        assert_eq!(candidate.original_language, "en");
        assert!(candidate.genre_ids.is_empty());
        assert!(candidate.poster_url.is_none());
    }
}

use serde::{Deserialize, Serialize};

/// A movie already in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryMovie {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

impl LibraryMovie {
    pub fn new(title: impl Into<String>, year: Option<u32>) -> Self {
        Self {
            title: title.into(),
            year,
        }
    }
}

/// Request to add a movie to the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddMovieRequest {
    pub title: String,
    pub tmdb_id: u32,
    pub quality_profile_id: u32,
    pub metadata_profile_id: u32,
    pub root_folder_path: String,
    pub search_on_add: bool,
}

/// What the library said about an add request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMovieResponse {
    pub created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AddMovieResponse {
    pub fn created() -> Self {
        Self {
            created: true,
            error_message: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            created: false,
            error_message: Some(message.into()),
        }
    }
}

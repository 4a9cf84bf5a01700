//! Mock library service for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::library::{AddMovieRequest, AddMovieResponse, LibraryError, LibraryMovie, LibraryService};

/// Mock implementation of the LibraryService trait.
///
/// Created movies are appended to the listing, like a real library would.
#[derive(Debug)]
pub struct MockLibraryService {
    /// Current library contents.
    movies: Arc<RwLock<Vec<LibraryMovie>>>,
    /// Recorded add requests.
    add_requests: Arc<RwLock<Vec<AddMovieRequest>>>,
    /// Response to add requests (default: created).
    add_response: Arc<RwLock<AddMovieResponse>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<LibraryError>>>,
}

impl Default for MockLibraryService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLibraryService {
    pub fn new() -> Self {
        Self {
            movies: Arc::new(RwLock::new(Vec::new())),
            add_requests: Arc::new(RwLock::new(Vec::new())),
            add_response: Arc::new(RwLock::new(AddMovieResponse::created())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_movies(&self, movies: Vec<LibraryMovie>) {
        *self.movies.write().await = movies;
    }

    pub async fn set_add_response(&self, response: AddMovieResponse) {
        *self.add_response.write().await = response;
    }

    pub async fn set_next_error(&self, error: LibraryError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn add_requests(&self) -> Vec<AddMovieRequest> {
        self.add_requests.read().await.clone()
    }

    async fn take_error(&self) -> Option<LibraryError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl LibraryService for MockLibraryService {
    async fn list_movies(&self) -> Result<Vec<LibraryMovie>, LibraryError> {
        if let Some(error) = self.take_error().await {
            return Err(error);
        }
        Ok(self.movies.read().await.clone())
    }

    async fn add_movie(&self, request: &AddMovieRequest) -> Result<AddMovieResponse, LibraryError> {
        self.add_requests.write().await.push(request.clone());

        if let Some(error) = self.take_error().await {
            return Err(error);
        }

        let response = self.add_response.read().await.clone();
        if response.created {
            self.movies
                .write()
                .await
                .push(LibraryMovie::new(request.title.clone(), None));
        }
        Ok(response)
    }
}

//! Adding a recommended (or arbitrary) title to the library.

use tracing::{debug, error, info, warn};

use super::engine::DiscoveryEngine;
use super::events::DiscoveryEvent;
use super::types::{AddOutcome, UNKNOWN_YEAR};
use crate::library::AddMovieRequest;
use crate::metrics::ADD_ATTEMPTS;

/// Library rejection messages, checked in order.
pub const REJECTION_RULES: &[(&str, AddOutcome)] = &[
    ("already exists in the database", AddOutcome::AlreadyInLibrary),
    ("configured for an existing movie", AddOutcome::AlreadyInLibrary),
    ("Invalid Path", AddOutcome::InvalidPath),
    ("ID was not found", AddOutcome::InvalidIdentity),
];

/// Classify a library rejection message. Unrecognized messages are `Failed`.
pub fn classify_rejection(message: &str) -> AddOutcome {
    REJECTION_RULES
        .iter()
        .find(|(pattern, _)| message.contains(pattern))
        .map(|(_, outcome)| *outcome)
        .unwrap_or(AddOutcome::Failed)
}

impl DiscoveryEngine {
    /// Add a title to the library and record the outcome on the matching
    /// recommendation, if there is one.
    ///
    /// `year` of `"0000"` or empty means the year is unknown.
    pub async fn add_title(&self, name: &str, year: &str) -> AddOutcome {
        let outcome = self.submit_title(name, year).await;
        info!("Add '{}' ({}): {}", name, year, outcome.as_str());
        ADD_ATTEMPTS.with_label_values(&[outcome.as_str()]).inc();
        self.record_add_outcome(name, outcome).await;
        outcome
    }

    async fn submit_title(&self, name: &str, year: &str) -> AddOutcome {
        let known_id = {
            let state = self.state.lock().await;
            state
                .accumulated
                .iter()
                .find(|r| r.name == name && r.year == year)
                .map(|r| r.tmdb_id)
        };

        if self.mirror.read().await.contains(name) {
            debug!("'{}' is already in the library snapshot", name);
            return AddOutcome::AlreadyInLibrary;
        }

        let tmdb_id = match known_id {
            Some(id) => id,
            None => {
                let year = Some(year).filter(|y| !y.is_empty() && *y != UNKNOWN_YEAR);
                match self.resolver.resolve(self.graph.as_ref(), name, year).await {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        self.notify_no_match(name);
                        return AddOutcome::FailedNoMatch;
                    }
                    Err(e) => {
                        warn!("Failed to resolve '{}' for add: {}", name, e);
                        self.notify_no_match(name);
                        return AddOutcome::FailedNoMatch;
                    }
                }
            }
        };

        let outcome = if self.add_settings.dry_run {
            info!("Dry run: not submitting '{}' ({}) to the library", name, tmdb_id);
            AddOutcome::Added
        } else {
            let request = AddMovieRequest {
                title: name.to_string(),
                tmdb_id,
                quality_profile_id: self.add_settings.quality_profile_id,
                metadata_profile_id: self.add_settings.metadata_profile_id,
                root_folder_path: self.connection.read().await.root_folder_path.clone(),
                search_on_add: self.add_settings.search_on_add,
            };
            match self.library.add_movie(&request).await {
                Ok(response) if response.created => AddOutcome::Added,
                Ok(response) => {
                    let message = response.error_message.unwrap_or_default();
                    warn!("Library rejected '{}': {}", name, message);
                    classify_rejection(&message)
                }
                Err(e) => {
                    error!("Failed to submit '{}' to the library: {}", name, e);
                    AddOutcome::Failed
                }
            }
        };

        if outcome == AddOutcome::Added {
            self.mirror.write().await.insert(name);
        }
        outcome
    }

    async fn record_add_outcome(&self, name: &str, outcome: AddOutcome) {
        let mut state = self.state.lock().await;
        if let Some(recommendation) = state.accumulated.iter_mut().find(|r| r.name == name) {
            recommendation.status = outcome.status();
            let recommendation = recommendation.clone();
            self.events
                .emit(DiscoveryEvent::ResultUpdated { recommendation });
        }
    }

    fn notify_no_match(&self, name: &str) {
        self.events.emit(DiscoveryEvent::Notification {
            title: "Failed to add Movie".to_string(),
            message: format!("No Matching Movie for: '{}' in The Movie Database.", name),
        });
    }
}

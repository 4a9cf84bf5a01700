//! Recommendation discovery.
//!
//! Cross-references the user's library against TMDB recommendations and
//! streams accepted titles to observers as they are found.

mod add;
mod engine;
mod events;
mod filter;
mod mirror;
pub mod normalize;
mod resolver;
mod types;

pub use add::{classify_rejection, REJECTION_RULES};
pub use engine::{DiscoveryEngine, MAX_SEEDS_PER_PASS, RESAMPLE_LIMIT};
pub use events::{DiscoveryEvent, EventBroadcaster};
pub use filter::{FilterPolicy, LanguageFilter, Rejection};
pub use mirror::CatalogMirror;
pub use resolver::{title_score, IdentityResolver, MATCH_THRESHOLD};
pub use types::*;

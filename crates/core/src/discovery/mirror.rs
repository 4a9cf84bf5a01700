//! In-memory snapshot of the user's library.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::normalize::{library_name, title_key};
use super::types::LibraryItem;
use crate::library::LibraryMovie;

/// Library titles plus a lookup set of their [`title_key`]s.
#[derive(Debug, Clone, Default)]
pub struct CatalogMirror {
    items: Vec<LibraryItem>,
    lookup: HashSet<String>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CatalogMirror {
    /// Build a snapshot from the library listing, sorted case-insensitively.
    pub fn from_movies(movies: &[LibraryMovie], checked: bool) -> Self {
        let mut items: Vec<LibraryItem> = movies
            .iter()
            .map(|movie| LibraryItem {
                name: library_name(&movie.title),
                checked,
            })
            .collect();
        items.sort_by_key(|item| item.name.to_lowercase());

        let lookup = items.iter().map(|item| title_key(&item.name)).collect();

        Self {
            items,
            lookup,
            refreshed_at: Some(Utc::now()),
        }
    }

    pub fn items(&self) -> &[LibraryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Whether a title (any casing or accents) is already in the library.
    pub fn contains(&self, title: &str) -> bool {
        self.lookup.contains(&title_key(title))
    }

    /// Mark exactly the named items as checked and return the seed names.
    pub fn select(&mut self, names: &HashSet<String>) -> Vec<String> {
        let mut seeds = Vec::new();
        let mut seen = HashSet::new();
        for item in &mut self.items {
            item.checked = names.contains(&item.name);
            if item.checked && seen.insert(item.name.clone()) {
                seeds.push(item.name.clone());
            }
        }
        seeds
    }

    /// Record a movie that was just added. Returns false if it was already present.
    pub fn insert(&mut self, title: &str) -> bool {
        let name = library_name(title);
        if !self.lookup.insert(title_key(&name)) {
            return false;
        }
        self.items.push(LibraryItem {
            name,
            checked: false,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror() -> CatalogMirror {
        CatalogMirror::from_movies(
            &[
                LibraryMovie::new("Interstellar", Some(2014)),
                LibraryMovie::new("amélie (2001)", Some(2001)),
                LibraryMovie::new("Inception", Some(2010)),
            ],
            false,
        )
    }

    #[test]
    fn test_from_movies_normalizes_and_sorts() {
        let m = mirror();
        let names: Vec<&str> = m.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["amelie", "Inception", "Interstellar"]);
    }

    #[test]
    fn test_contains_ignores_case_and_accents() {
        let mirror = mirror();
        assert!(mirror.contains("INTERSTELLAR"));
        assert!(mirror.contains("Amélie"));
        assert!(!mirror.contains("Tenet"));
    }

    #[test]
    fn test_select_marks_checked() {
        let mut mirror = mirror();
        let names: HashSet<String> = ["Inception".to_string(), "Tenet".to_string()].into();

        let seeds = mirror.select(&names);

        assert_eq!(seeds, vec!["Inception"]);
        let checked: Vec<bool> = mirror.items().iter().map(|i| i.checked).collect();
        assert_eq!(checked, vec![false, true, false]);
    }

    #[test]
    fn test_select_disjoint_is_empty() {
        let mut mirror = mirror();
        let names: HashSet<String> = ["Tenet".to_string()].into();
        assert!(mirror.select(&names).is_empty());
        assert!(mirror.items().iter().all(|i| !i.checked));
    }

    #[test]
    fn test_insert_does_not_duplicate() {
        let mut mirror = mirror();
        assert!(mirror.insert("Tenet"));
        assert!(!mirror.insert("tenet"));
        assert_eq!(mirror.len(), 4);
        assert!(mirror.contains("Tenet"));
    }
}

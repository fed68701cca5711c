//! Container for merging places from several providers

use super::types::{Place, PlaceKey, PlaceSource};
use crate::providers::ProviderError;
use std::collections::HashSet;

/// A provider that failed or timed out during a merged search
#[derive(Debug, Clone)]
pub struct UnresponsiveProvider {
    pub source: PlaceSource,
    pub error: ProviderError,
}

/// Ordered, deduplicated and capped collection of places.
///
/// Places are kept in insertion order; the first place seen for a given
/// `(source, place_id)` wins and anything past the limit is dropped.
#[derive(Debug, Clone)]
pub struct PlaceContainer {
    places: Vec<Place>,
    seen: HashSet<PlaceKey>,
    limit: usize,
    duplicates: usize,
    unresponsive: Vec<UnresponsiveProvider>,
}

impl PlaceContainer {
    pub fn new(limit: usize) -> Self {
        Self {
            places: Vec::with_capacity(limit),
            seen: HashSet::new(),
            limit,
            duplicates: 0,
            unresponsive: Vec::new(),
        }
    }

    /// Add a place, returning whether it was kept
    pub fn add(&mut self, place: Place) -> bool {
        if self.is_full() {
            return false;
        }

        if !self.seen.insert(place.key()) {
            self.duplicates += 1;
            return false;
        }

        self.places.push(place);
        true
    }

    pub fn extend(&mut self, places: impl IntoIterator<Item = Place>) {
        for place in places {
            if self.is_full() {
                break;
            }
            self.add(place);
        }
    }

    pub fn add_unresponsive(&mut self, source: PlaceSource, error: ProviderError) {
        self.unresponsive.push(UnresponsiveProvider { source, error });
    }

    pub fn is_full(&self) -> bool {
        self.places.len() >= self.limit
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn unresponsive(&self) -> &[UnresponsiveProvider] {
        &self.unresponsive
    }

    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn into_places(self) -> Vec<Place> {
        self.places
    }
}

//! Feature names and feature vectors

use crate::{FormError, Result, Venue};
use serde::Serialize;
use std::collections::BTreeMap;

/// Deterministic rolling feature name: `<venue>_<stat>_rolling_<window>`
pub fn feature_name(venue: Venue, stat: &str, window: usize) -> String {
    format!("{}_{}_rolling_{}", venue.as_str(), stat, window)
}

/// Feature names for a venue's statistics, in statistic order
pub fn feature_names(venue: Venue, stats: &[String], window: usize) -> Vec<String> {
    stats
        .iter()
        .map(|s| feature_name(venue, s, window))
        .collect()
}

/// Named feature values; `None` marks an unknown value.
///
/// Built once and never mutated: combining vectors yields a new one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureVector {
    values: BTreeMap<String, Option<f64>>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries, failing on a repeated name
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Option<f64>)>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in entries {
            if values.insert(name.clone(), value).is_some() {
                return Err(FormError::DuplicateFeature(name));
            }
        }
        Ok(FeatureVector { values })
    }

    /// Union of two vectors; any shared name is a `DuplicateFeature` error
    pub fn merge(self, other: FeatureVector) -> Result<Self> {
        Self::from_entries(self.values.into_iter().chain(other.values))
    }

    /// Copy without the named features
    pub fn without(&self, names: &[String]) -> Self {
        FeatureVector {
            values: self
                .values
                .iter()
                .filter(|(k, _)| !names.contains(k))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Value of a feature; `None` if unknown or not present
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().flatten()
    }

    /// Raw entry: `None` if the feature is not present at all
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

//! Weighted relation sets attached to every entity.
//!
//! A [`RelevantProperties`] records which classes, methods and fields an
//! entity structurally touches, each tagged with an integer importance
//! weight. Every distance metric in the crate is built on the weighted
//! intersection and union sizes computed here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Category of a structural relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Containing or contained class
    Class,
    /// Method that does not override a supertype method
    Method,
    /// Method overriding a supertype method
    OverridingMethod,
    /// Field
    Field,
}

impl PropertyKind {
    /// All kinds in storage order.
    pub const ALL: [PropertyKind; 4] = [
        PropertyKind::Class,
        PropertyKind::Method,
        PropertyKind::OverridingMethod,
        PropertyKind::Field,
    ];
}

/// Weighted set of structurally related names for one entity.
///
/// A name's weight is the maximum of every weight it was added with; it only
/// decreases through [`RelevantProperties::remove`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevantProperties {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    classes: IndexMap<String, u32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    methods: IndexMap<String, u32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    overriding_methods: IndexMap<String, u32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    fields: IndexMap<String, u32>,
}

impl RelevantProperties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: PropertyKind) -> &IndexMap<String, u32> {
        match kind {
            PropertyKind::Class => &self.classes,
            PropertyKind::Method => &self.methods,
            PropertyKind::OverridingMethod => &self.overriding_methods,
            PropertyKind::Field => &self.fields,
        }
    }

    fn map_mut(&mut self, kind: PropertyKind) -> &mut IndexMap<String, u32> {
        match kind {
            PropertyKind::Class => &mut self.classes,
            PropertyKind::Method => &mut self.methods,
            PropertyKind::OverridingMethod => &mut self.overriding_methods,
            PropertyKind::Field => &mut self.fields,
        }
    }

    /// Record a relation, keeping the larger weight if `name` is already present.
    pub fn add(&mut self, kind: PropertyKind, name: impl Into<String>, weight: u32) {
        let slot = self.map_mut(kind).entry(name.into()).or_insert(weight);
        *slot = (*slot).max(weight);
    }

    /// Builder form of [`RelevantProperties::add`].
    pub fn with(mut self, kind: PropertyKind, name: impl Into<String>, weight: u32) -> Self {
        self.add(kind, name, weight);
        self
    }

    /// Drop a relation, returning its weight.
    pub fn remove(&mut self, kind: PropertyKind, name: &str) -> Option<u32> {
        self.map_mut(kind).shift_remove(name)
    }

    /// Weight recorded for `name`, if any
    pub fn weight(&self, kind: PropertyKind, name: &str) -> Option<u32> {
        self.map(kind).get(name).copied()
    }

    /// Check whether a relation to `name` exists
    pub fn contains(&self, kind: PropertyKind, name: &str) -> bool {
        self.map(kind).contains_key(name)
    }

    /// Names of one relation kind, in insertion order
    pub fn names(&self, kind: PropertyKind) -> impl Iterator<Item = &str> {
        self.map(kind).keys().map(String::as_str)
    }

    /// Every `(kind, name, weight)` entry
    pub fn iter(&self) -> impl Iterator<Item = (PropertyKind, &str, u32)> {
        PropertyKind::ALL.into_iter().flat_map(move |kind| {
            self.map(kind)
                .iter()
                .map(move |(name, &weight)| (kind, name.as_str(), weight))
        })
    }

    /// Classes this entity relates to.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.names(PropertyKind::Class)
    }

    /// Number of distinct entries across all kinds
    pub fn len(&self) -> usize {
        PropertyKind::ALL.iter().map(|&k| self.map(k).len()).sum()
    }

    /// Check if no relation has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all weights.
    pub fn size(&self) -> u64 {
        PropertyKind::ALL
            .iter()
            .flat_map(|&k| self.map(k).values())
            .map(|&w| u64::from(w))
            .sum()
    }

    /// Weighted size of the intersection with `other`.
    ///
    /// `combine` folds the two weights of a shared entry into its contribution
    /// (typically `u32::min`).
    pub fn size_of_intersection<F>(&self, other: &RelevantProperties, combine: F) -> u64
    where
        F: Fn(u32, u32) -> u32,
    {
        let mut total = 0u64;
        for kind in PropertyKind::ALL {
            let (small, large) = if self.map(kind).len() <= other.map(kind).len() {
                (self.map(kind), other.map(kind))
            } else {
                (other.map(kind), self.map(kind))
            };
            for (name, &w) in small {
                if let Some(&v) = large.get(name) {
                    total += u64::from(combine(w, v));
                }
            }
        }
        total
    }

    /// Weighted size of the union with `other`: every entry counted once at
    /// its larger weight.
    pub fn size_of_union(&self, other: &RelevantProperties) -> u64 {
        self.size() + other.size() - self.size_of_intersection(other, u32::min)
    }
}

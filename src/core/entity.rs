//! Code entities and the corpus handed over by the extraction layer.
//!
//! An [`Entity`] stands for one class, method or field. Category-specific
//! rules (which kinds can move, which have a containing class) are answered
//! by [`EntityKind`] rather than by separate entity types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::distance::{DistanceMetric, StructuralDistance};
use crate::core::errors::{MovewiseError, Result};
use crate::core::properties::{PropertyKind, RelevantProperties};

/// Category of a code element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A class (or any other type declaration)
    Class,
    /// A method or constructor
    Method,
    /// A field
    Field,
}

impl EntityKind {
    /// Whether elements of this kind live inside a class.
    pub fn has_containing_class(self) -> bool {
        !matches!(self, EntityKind::Class)
    }

    /// Whether elements of this kind can ever be the subject of a move.
    pub fn can_move(self) -> bool {
        self.has_containing_class()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Class => "class",
            EntityKind::Method => "method",
            EntityKind::Field => "field",
        };
        f.write_str(label)
    }
}

fn default_movable() -> bool {
    true
}

/// One code element with its feature vector and relation set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    name: String,
    kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class_name: Option<String>,
    #[serde(default)]
    features: Vec<f64>,
    #[serde(default)]
    properties: RelevantProperties,
    #[serde(default = "default_movable")]
    movable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tokens: Vec<String>,
    #[serde(skip)]
    id: usize,
}

impl Entity {
    fn new(name: impl Into<String>, kind: EntityKind, class_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            class_name,
            features: Vec::new(),
            properties: RelevantProperties::new(),
            movable: kind.can_move(),
            tokens: Vec::new(),
            id: 0,
        }
    }

    /// Create a class entity
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Class, None)
    }

    /// Create a method entity contained in `class_name`
    pub fn method(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Method, Some(class_name.into()))
    }

    /// Create a field entity contained in `class_name`
    pub fn field(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self::new(name, EntityKind::Field, Some(class_name.into()))
    }

    /// Set the feature vector
    pub fn with_features(mut self, features: Vec<f64>) -> Self {
        self.features = features;
        self
    }

    /// Replace the relation set
    pub fn with_properties(mut self, properties: RelevantProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Add a single relation
    pub fn with_relation(mut self, kind: PropertyKind, name: impl Into<String>, weight: u32) -> Self {
        self.properties.add(kind, name, weight);
        self
    }

    /// Set movability; ignored for classes
    pub fn with_movable(mut self, movable: bool) -> Self {
        self.movable = movable && self.kind.can_move();
        self
    }

    /// Set the identifier bag used by contextual distances
    pub fn with_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// Private mutable view for algorithms that rewrite relations during a run.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name after the last `.`, ignoring any parameter list.
    pub fn simple_name(&self) -> &str {
        let head = self.name.split('(').next().unwrap_or(&self.name);
        head.rsplit('.').next().unwrap_or(head)
    }

    /// Category of this element
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Containing class for members, the entity's own name for classes.
    pub fn class_name(&self) -> &str {
        match self.kind {
            EntityKind::Class => &self.name,
            EntityKind::Method | EntityKind::Field => {
                self.class_name.as_deref().unwrap_or_default()
            }
        }
    }

    /// Feature vector
    pub fn features(&self) -> &[f64] {
        &self.features
    }

    /// Weighted relations
    pub fn properties(&self) -> &RelevantProperties {
        &self.properties
    }

    /// Identifier tokens
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Insertion-order identifier assigned by the corpus
    pub fn id(&self) -> usize {
        self.id
    }

    /// True for a method or field the extraction layer allows to move
    pub fn is_movable(&self) -> bool {
        self.movable && self.kind.can_move()
    }

    /// True for a field
    pub fn is_field(&self) -> bool {
        self.kind == EntityKind::Field
    }

    /// Distance using the default structural metric.
    pub fn distance(&self, other: &Entity) -> f64 {
        StructuralDistance.distance(self, other)
    }

    pub(crate) fn properties_mut(&mut self) -> &mut RelevantProperties {
        &mut self.properties
    }

    pub(crate) fn set_class_name(&mut self, class_name: impl Into<String>) {
        if self.kind.has_containing_class() {
            self.class_name = Some(class_name.into());
        }
    }
}

/// Serialized shape of a corpus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CorpusData {
    #[serde(default)]
    classes: Vec<Entity>,
    #[serde(default)]
    methods: Vec<Entity>,
    #[serde(default)]
    fields: Vec<Entity>,
    #[serde(default)]
    include_fields: bool,
}

/// The full entity set one search run operates on.
///
/// Ids are assigned in order: classes, then methods, then fields.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "CorpusData", into = "CorpusData")]
pub struct EntityCorpus {
    classes: Vec<Entity>,
    methods: Vec<Entity>,
    fields: Vec<Entity>,
    include_fields: bool,
    index: HashMap<String, usize>,
    metric: Arc<dyn DistanceMetric>,
}

impl fmt::Debug for EntityCorpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCorpus")
            .field("classes", &self.classes.len())
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .field("include_fields", &self.include_fields)
            .field("metric", &self.metric.name())
            .finish()
    }
}

impl TryFrom<CorpusData> for EntityCorpus {
    type Error = MovewiseError;

    fn try_from(data: CorpusData) -> Result<Self> {
        Self::new(data.classes, data.methods, data.fields, data.include_fields)
    }
}

impl From<EntityCorpus> for CorpusData {
    fn from(corpus: EntityCorpus) -> Self {
        Self {
            classes: corpus.classes,
            methods: corpus.methods,
            fields: corpus.fields,
            include_fields: corpus.include_fields,
        }
    }
}

/// Construction and lookup methods for [`EntityCorpus`].
impl EntityCorpus {
    /// Build a corpus, checking kinds and name uniqueness.
    pub fn new(
        classes: Vec<Entity>,
        methods: Vec<Entity>,
        fields: Vec<Entity>,
        include_fields: bool,
    ) -> Result<Self> {
        let mut corpus = Self {
            classes,
            methods,
            fields,
            include_fields,
            index: HashMap::new(),
            metric: Arc::new(StructuralDistance),
        };

        let mut next_id = 0usize;
        let groups = [
            (EntityKind::Class, &mut corpus.classes),
            (EntityKind::Method, &mut corpus.methods),
            (EntityKind::Field, &mut corpus.fields),
        ];
        for (expected, entities) in groups {
            for entity in entities.iter_mut() {
                if entity.kind != expected {
                    return Err(MovewiseError::validation_field(
                        format!("'{}' is a {} but was listed as a {expected}", entity.name, entity.kind),
                        entity.name.clone(),
                    ));
                }
                if expected.has_containing_class()
                    && entity.class_name.as_deref().map_or(true, str::is_empty)
                {
                    return Err(MovewiseError::validation_field(
                        format!("{expected} '{}' has no containing class", entity.name),
                        entity.name.clone(),
                    ));
                }
                if !expected.can_move() {
                    entity.movable = false;
                }
                entity.id = next_id;
                if corpus.index.insert(entity.name.clone(), next_id).is_some() {
                    return Err(MovewiseError::validation_field(
                        format!("duplicate entity name '{}'", entity.name),
                        entity.name.clone(),
                    ));
                }
                next_id += 1;
            }
        }

        Ok(corpus)
    }

    /// Replace the distance metric
    pub fn with_metric(mut self, metric: Arc<dyn DistanceMetric>) -> Self {
        self.metric = metric;
        self
    }

    /// Class entities
    pub fn classes(&self) -> &[Entity] {
        &self.classes
    }

    /// Method entities
    pub fn methods(&self) -> &[Entity] {
        &self.methods
    }

    /// Field entities
    pub fn fields(&self) -> &[Entity] {
        &self.fields
    }

    /// Whether field moves were requested
    pub fn include_fields(&self) -> bool {
        self.include_fields
    }

    /// Total number of entities, fields included
    pub fn len(&self) -> usize {
        self.classes.len() + self.methods.len() + self.fields.len()
    }

    /// Check if the corpus holds no entity
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up any entity by qualified name
    pub fn get(&self, name: &str) -> Option<&Entity> {
        let id = *self.index.get(name)?;
        self.by_id(id)
    }

    /// Look up a class by name
    pub fn class(&self, name: &str) -> Option<&Entity> {
        self.get(name).filter(|e| e.kind == EntityKind::Class)
    }

    /// Look up an entity by id
    pub fn by_id(&self, id: usize) -> Option<&Entity> {
        let methods_start = self.classes.len();
        let fields_start = methods_start + self.methods.len();
        if id < methods_start {
            self.classes.get(id)
        } else if id < fields_start {
            self.methods.get(id - methods_start)
        } else {
            self.fields.get(id - fields_start)
        }
    }

    /// Entities taking part in clustering: classes, methods, and fields when requested.
    pub fn clustering_entities(&self) -> impl Iterator<Item = &Entity> {
        let fields: &[Entity] = if self.include_fields { &self.fields } else { &[] };
        self.classes.iter().chain(self.methods.iter()).chain(fields.iter())
    }

    /// Members that may receive a suggestion.
    pub fn movable_members(&self) -> impl Iterator<Item = &Entity> {
        let fields: &[Entity] = if self.include_fields { &self.fields } else { &[] };
        self.methods
            .iter()
            .chain(fields.iter())
            .filter(|e| e.is_movable())
    }

    /// Methods whose containing class is `class_name`
    pub fn methods_of<'a>(&'a self, class_name: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.methods.iter().filter(move |m| m.class_name() == class_name)
    }

    /// Distance under the corpus metric
    pub fn distance(&self, a: &Entity, b: &Entity) -> f64 {
        self.metric.distance(a, b)
    }

    /// The active metric
    pub fn metric(&self) -> &dyn DistanceMetric {
        self.metric.as_ref()
    }
}

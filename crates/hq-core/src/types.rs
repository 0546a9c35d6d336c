//! Declared property types and write policies

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Text,
    Date,
    DateTime,
    Uuid,
}

/// Collection kinds a declared property can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Fixed-length sequence, order preserving
    Array,
    /// Growable sequence, order preserving
    List,
    /// Unordered set
    Set,
    /// Set ordered by element
    SortedSet,
    /// Unordered map
    Map,
    /// Map ordered by key
    SortedMap,
    /// Map keeping insertion order
    OrderedMap,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::List => "list",
            Self::Set => "set",
            Self::SortedSet => "sorted_set",
            Self::Map => "map",
            Self::SortedMap => "sorted_map",
            Self::OrderedMap => "ordered_map",
        }
    }

    /// Whether the kind holds key/value entries
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map | Self::SortedMap | Self::OrderedMap)
    }

    /// Whether iteration order equals insertion order
    pub fn preserves_order(&self) -> bool {
        matches!(self, Self::Array | Self::List | Self::OrderedMap)
    }
}

/// Declared type of a model property
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Scalar(ScalarKind),
    Collection(CollectionKind),
    /// Registered model type, by name
    Model(String),
}

impl PropertyType {
    pub fn model(name: impl Into<String>) -> Self {
        Self::Model(name.into())
    }

    pub fn is_collection_like(&self) -> bool {
        matches!(self, Self::Collection(_))
    }

    pub fn model_name(&self) -> Option<&str> {
        match self {
            Self::Model(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{:?}", kind),
            Self::Collection(kind) => f.write_str(kind.as_str()),
            Self::Model(name) => f.write_str(name),
        }
    }
}

/// What to do with absent intermediates when writing through a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// Writing an absent value does not materialize missing intermediates
    #[default]
    None,
    /// Always materialize missing intermediates
    Initialize,
    /// Materialize intermediates and replace an absent collection with an empty one
    InitializeCollection,
}

impl NullPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "initialize" => Some(Self::Initialize),
            "initialize_collection" => Some(Self::InitializeCollection),
            _ => None,
        }
    }
}

/// Whether collection values are copied into the declared kind on write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPolicy {
    /// Write the supplied collection as-is
    None,
    /// Copy into a fresh collection of the declared kind
    #[default]
    Copy,
}

impl CollectionPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Self::None),
            "copy" => Some(Self::Copy),
            _ => None,
        }
    }
}

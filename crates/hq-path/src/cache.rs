//! Accessor cache
//!
//! Compiling a path walks the registry and instantiates probe objects, so
//! accessors are compiled once per (root, path, separator, overrides) and
//! shared afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use hq_core::{HqError, HqResult, PropertyType};
use regex::Regex;

use crate::accessor::PathAccessor;
use crate::schema::SchemaRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AccessorKey {
    root: String,
    path: String,
    separator: String,
    explicit: BTreeMap<usize, PropertyType>,
}

/// Concurrent cache of compiled accessors over one registry
#[derive(Debug)]
pub struct AccessorCache {
    registry: Arc<SchemaRegistry>,
    separators: DashMap<String, Regex>,
    accessors: DashMap<AccessorKey, Arc<PathAccessor>>,
}

impl AccessorCache {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            separators: DashMap::new(),
            accessors: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Accessor for a `.`-separated path without overrides
    pub fn get(&self, root: &str, path: &str) -> HqResult<Arc<PathAccessor>> {
        self.get_with(root, path, r"\.", &BTreeMap::new())
    }

    pub fn get_with(
        &self,
        root: &str,
        path: &str,
        separator: &str,
        explicit: &BTreeMap<usize, PropertyType>,
    ) -> HqResult<Arc<PathAccessor>> {
        let key = AccessorKey {
            root: root.to_string(),
            path: path.to_string(),
            separator: separator.to_string(),
            explicit: explicit.clone(),
        };
        if let Some(cached) = self.accessors.get(&key) {
            return Ok(Arc::clone(cached.value()));
        }

        let pattern = self.separator(separator)?;
        let accessor = Arc::new(PathAccessor::compile(
            &self.registry,
            path,
            &pattern,
            root,
            explicit,
        )?);
        // A concurrent compile of the same key may have won; keep the first
        let entry = self.accessors.entry(key).or_insert(accessor);
        Ok(Arc::clone(entry.value()))
    }

    fn separator(&self, pattern: &str) -> HqResult<Regex> {
        if let Some(regex) = self.separators.get(pattern) {
            return Ok(regex.value().clone());
        }
        let regex = Regex::new(pattern)
            .map_err(|e| HqError::InvalidArgument(format!("invalid separator '{}': {}", pattern, e)))?;
        self.separators.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }

    pub fn clear(&self) {
        self.accessors.clear();
    }
}

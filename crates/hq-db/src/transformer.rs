//! Projection rows to objects
//!
//! Each select alias names a property path of the target type, with path
//! segments joined by a separator. A tuple row becomes a fresh target
//! instance with every value written through the alias's accessor.

use std::collections::BTreeMap;
use std::sync::Arc;

use hq_core::{HqError, HqResult, Model, PropertyType, Value};
use hq_path::{AccessorCache, PathAccessor};
use once_cell::sync::OnceCell;
use tracing::debug;

/// Builds target objects from alias tuples
pub struct AliasToBeanTransformer {
    target: String,
    cache: Arc<AccessorCache>,
    separator: char,
    skip_component: Option<String>,
    class_replacements: BTreeMap<String, String>,
    accessors: OnceCell<Vec<Arc<PathAccessor>>>,
}

impl AliasToBeanTransformer {
    pub fn new(target: impl Into<String>, cache: Arc<AccessorCache>) -> Self {
        Self {
            target: target.into(),
            cache,
            separator: '.',
            skip_component: None,
            class_replacements: BTreeMap::new(),
            accessors: OnceCell::new(),
        }
    }

    /// Separator between path segments inside an alias
    pub fn use_path_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self.accessors = OnceCell::new();
        self
    }

    /// Drop `component` and the separators after it from the front of every alias
    pub fn skip_leading_component(mut self, component: &str) -> HqResult<Self> {
        if component.trim().is_empty() {
            return Err(HqError::InvalidArgument(
                "skipped alias component must not be blank".to_string(),
            ));
        }
        self.skip_component = Some(component.to_string());
        self.accessors = OnceCell::new();
        Ok(self)
    }

    /// Instantiate `type_name` for the nested object at `path`
    ///
    /// `path` is `.`-separated regardless of the alias separator.
    pub fn class_replacement(mut self, path: &str, type_name: impl Into<String>) -> Self {
        self.class_replacements.insert(path.to_string(), type_name.into());
        self.accessors = OnceCell::new();
        self
    }

    pub fn class_replacements(self, replacements: &BTreeMap<String, String>) -> Self {
        replacements
            .iter()
            .fold(self, |transformer, (path, type_name)| {
                transformer.class_replacement(path, type_name.clone())
            })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    fn strip(&self, alias: &str) -> String {
        match &self.skip_component {
            Some(component) => alias
                .strip_prefix(component.as_str())
                .map(|rest| rest.trim_start_matches(self.separator))
                .unwrap_or(alias)
                .to_string(),
            None => alias.to_string(),
        }
    }

    fn explicit_types(&self, path: &str) -> BTreeMap<usize, PropertyType> {
        let separator = self.separator.to_string();
        self.class_replacements
            .iter()
            .map(|(key, type_name)| (key.replace('.', &separator), type_name))
            .filter(|(key, _)| {
                path == key
                    || path
                        .strip_prefix(key.as_str())
                        .is_some_and(|rest| rest.starts_with(self.separator))
            })
            .map(|(key, type_name)| (key.matches(self.separator).count(), PropertyType::model(type_name.as_str())))
            .collect()
    }

    fn compile(&self, aliases: &[String]) -> HqResult<Vec<Arc<PathAccessor>>> {
        let pattern = regex::escape(&self.separator.to_string());
        let accessors = aliases
            .iter()
            .map(|alias| {
                let path = self.strip(alias);
                let explicit = self.explicit_types(&path);
                self.cache.get_with(&self.target, &path, &pattern, &explicit)
            })
            .collect::<HqResult<Vec<_>>>()?;
        debug!(target_type = %self.target, aliases = aliases.len(), "compiled alias accessors");
        Ok(accessors)
    }

    /// Accessors for `aliases`; the first call fixes them for later rows
    pub fn accessors(&self, aliases: &[String]) -> HqResult<&[Arc<PathAccessor>]> {
        self.accessors
            .get_or_try_init(|| self.compile(aliases))
            .map(Vec::as_slice)
    }

    /// New target instance populated from one tuple
    ///
    /// Values past the last alias are ignored.
    pub fn transform_tuple(&self, tuple: Vec<Option<Value>>, aliases: &[String]) -> HqResult<Box<dyn Model>> {
        let accessors = self.accessors(aliases)?;
        if tuple.len() < accessors.len() {
            return Err(HqError::InvalidArgument(format!(
                "row has {} values for {} aliases",
                tuple.len(),
                accessors.len()
            )));
        }

        let mut instance = self.cache.registry().instantiate(&self.target, "")?;
        for (accessor, value) in accessors.iter().zip(tuple) {
            accessor.set_default(instance.as_mut(), value)?;
        }
        Ok(instance)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use hq_core::{Describe, ModelBox};
    use hq_path::{ModelType, SchemaRegistry};

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Address {
        pub city: Option<String>,
        pub zip: Option<i64>,
    }

    impl Describe for Address {
        const MODEL_NAME: &'static str = "Address";
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Office {
        pub city: Option<String>,
        pub floor: Option<i64>,
    }

    impl Describe for Office {
        const MODEL_NAME: &'static str = "Office";
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Person {
        pub name: Option<String>,
        pub age: i64,
        pub address: Option<Address>,
        pub workplace: Option<ModelBox>,
    }

    impl Describe for Person {
        const MODEL_NAME: &'static str = "Person";
    }

    pub fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with(
                ModelType::builder::<Address>()
                    .constructor(Address::default)
                    .value("city", |a| &a.city, |a| &mut a.city)
                    .value("zip", |a| &a.zip, |a| &mut a.zip)
                    .build(),
            )
            .with(ModelType::abstract_type("Place"))
            .with(
                ModelType::builder::<Office>()
                    .constructor(Office::default)
                    .extends("Place")
                    .value("city", |o| &o.city, |o| &mut o.city)
                    .value("floor", |o| &o.floor, |o| &mut o.floor)
                    .build(),
            )
            .with(
                ModelType::builder::<Person>()
                    .constructor(Person::default)
                    .value("name", |p| &p.name, |p| &mut p.name)
                    .value("age", |p| &p.age, |p| &mut p.age)
                    .nested("address", |p| &p.address, |p| &mut p.address)
                    .nested_dyn("workplace", "Place", |p| &p.workplace, |p| &mut p.workplace)
                    .build(),
            )
    }
}

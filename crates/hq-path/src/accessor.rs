//! Compiled property paths
//!
//! A `PathAccessor` resolves every segment of a dotted path once, against
//! the schema registry, and afterwards walks instances without any lookup.
//! Reads are best-effort; writes follow the null and collection policies.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use hq_core::{
    CollectionPolicy, HqError, HqResult, Model, ModelBox, NullPolicy, PathDefaults, PropertyType,
    PropertyValue, Value,
};
use regex::Regex;
use tracing::{debug, trace};

use crate::coerce::{coerce, empty_collection};
use crate::schema::{Factory, SchemaRegistry, Slot};

/// One resolved step of a path
#[derive(Clone)]
pub struct Segment {
    owner: String,
    name: String,
    declared: PropertyType,
    resolved: PropertyType,
    slot: Slot,
    factory: Option<Factory>,
    accepts: Option<Arc<HashSet<String>>>,
}

impl Segment {
    /// Type declaring the property
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &PropertyType {
        &self.declared
    }

    /// Declared type, or the explicit override given at compile time
    pub fn resolved_type(&self) -> &PropertyType {
        &self.resolved
    }

    pub fn is_collection_like(&self) -> bool {
        self.resolved.is_collection_like()
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("resolved", &self.resolved)
            .finish()
    }
}

/// Reusable accessor for one property path of one root type
#[derive(Clone)]
pub struct PathAccessor {
    path: String,
    root: String,
    roots: Arc<HashSet<String>>,
    segments: Vec<Segment>,
    null_policy: NullPolicy,
    collection_policy: CollectionPolicy,
}

impl PathAccessor {
    /// Compile `path` against `root` using the default `.` separator
    pub fn new(registry: &SchemaRegistry, path: &str, root: &str) -> HqResult<Self> {
        let separator = Regex::new(r"\.").map_err(|e| HqError::InvalidArgument(e.to_string()))?;
        Self::compile(registry, path, &separator, root, &BTreeMap::new())
    }

    /// Compile with the separator and policies from configuration
    pub fn with_config(
        registry: &SchemaRegistry,
        path: &str,
        root: &str,
        defaults: &PathDefaults,
    ) -> HqResult<Self> {
        let separator = defaults.separator_regex()?;
        Ok(Self::compile(registry, path, &separator, root, &BTreeMap::new())?
            .with_defaults(defaults.null_policy, defaults.collection_policy))
    }

    /// Resolve every segment of `path`
    ///
    /// `explicit` maps segment indexes to a type that replaces the declared
    /// one; it must be assignable to the declared type.
    pub fn compile(
        registry: &SchemaRegistry,
        path: &str,
        separator: &Regex,
        root: &str,
        explicit: &BTreeMap<usize, PropertyType>,
    ) -> HqResult<Self> {
        let root_type = registry
            .get(root)
            .ok_or_else(|| HqError::compilation(path, root, "root type is not registered"))?;
        // Trial instantiation: a root that cannot be built cannot be written
        let probe = root_type.instantiate().ok_or_else(|| HqError::Instantiation {
            type_name: root.to_string(),
            path: path.to_string(),
        })?;

        let names: Vec<&str> = separator.split(path).collect();
        if names.iter().any(|name| name.is_empty()) {
            return Err(HqError::compilation(path, root, "empty path segment"));
        }

        let mut owner = registry
            .get(probe.model_name())
            .cloned()
            .unwrap_or_else(|| Arc::clone(root_type));
        let mut segments = Vec::with_capacity(names.len());

        for (index, name) in names.iter().enumerate() {
            let property = owner.property(name).ok_or_else(|| {
                HqError::compilation(
                    path,
                    root,
                    format!("{} has no property '{}'", owner.name(), name),
                )
            })?;
            let declared = property.declared_type().clone();

            let resolved = match explicit.get(&index) {
                Some(override_type) if !registry.is_assignable(override_type, &declared) => {
                    return Err(HqError::TypeMismatch {
                        path: path.to_string(),
                        segment: index,
                        declared: declared.to_string(),
                        provided: override_type.to_string(),
                    });
                }
                Some(override_type) => override_type.clone(),
                None => declared.clone(),
            };

            let is_last = index + 1 == names.len();
            let (factory, accepts) = match (&resolved, property.slot()) {
                (PropertyType::Model(type_name), Slot::Nested { .. }) => {
                    let model_type = registry.get(type_name).ok_or_else(|| {
                        HqError::compilation(
                            path,
                            root,
                            format!("type {} is not registered", type_name),
                        )
                    })?;
                    (
                        model_type.factory().cloned(),
                        Some(Arc::new(registry.subtypes_of(type_name))),
                    )
                }
                _ if !is_last => {
                    return Err(HqError::compilation(
                        path,
                        root,
                        format!("'{}' of type {} cannot be navigated", name, resolved),
                    ));
                }
                _ => (None, None),
            };

            let next_owner = if is_last {
                None
            } else {
                let next = factory.as_ref().map(|factory| factory()).ok_or_else(|| {
                    HqError::Instantiation {
                        type_name: resolved.to_string(),
                        path: path.to_string(),
                    }
                })?;
                let concrete = next.model_name();
                Some(registry.get(concrete).cloned().ok_or_else(|| {
                    HqError::compilation(path, root, format!("type {} is not registered", concrete))
                })?)
            };

            segments.push(Segment {
                owner: owner.name().to_string(),
                name: name.to_string(),
                declared,
                resolved,
                slot: property.slot().clone(),
                factory,
                accepts,
            });
            if let Some(next_owner) = next_owner {
                owner = next_owner;
            }
        }

        debug!(
            root = %root,
            path = %path,
            segments = segments.len(),
            "compiled property path"
        );

        Ok(Self {
            path: path.to_string(),
            root: root.to_string(),
            roots: Arc::new(registry.subtypes_of(root)),
            segments,
            null_policy: NullPolicy::default(),
            collection_policy: CollectionPolicy::default(),
        })
    }

    /// Default policies used by `set_default`
    pub fn with_defaults(mut self, null_policy: NullPolicy, collection_policy: CollectionPolicy) -> Self {
        self.null_policy = null_policy;
        self.collection_policy = collection_policy;
        self
    }

    /// Read the terminal value; any failure along the way reads as absent
    pub fn get(&self, instance: &dyn Model) -> Option<Value> {
        if !self.roots.contains(instance.model_name()) {
            trace!(
                path = %self.path,
                expected = %self.root,
                found = instance.model_name(),
                "read on foreign instance"
            );
            return None;
        }

        let (terminal, intermediates) = self.segments.split_last()?;
        let mut current = instance;
        for segment in intermediates {
            let Slot::Nested { get, .. } = &segment.slot else {
                return None;
            };
            match get(current) {
                Some(next) => current = next,
                None => {
                    trace!(path = %self.path, segment = %segment.name, "absent intermediate on read");
                    return None;
                }
            }
        }

        match &terminal.slot {
            Slot::Leaf { get, .. } => get(current),
            Slot::Nested { get, .. } => get(current).map(|model| Value::Model(ModelBox::new(model.clone_model()))),
        }
    }

    /// Read and convert the terminal value
    pub fn read<V: PropertyValue>(&self, instance: &dyn Model) -> Option<V> {
        V::from_value(self.get(instance)).ok()
    }

    /// Write using the accessor's default policies
    pub fn set_default(&self, instance: &mut dyn Model, value: Option<Value>) -> HqResult<()> {
        self.set(instance, value, self.null_policy, self.collection_policy)
    }

    /// Write the terminal value, materializing intermediates as the policy allows
    pub fn set(
        &self,
        instance: &mut dyn Model,
        value: Option<Value>,
        null_policy: NullPolicy,
        collection_policy: CollectionPolicy,
    ) -> HqResult<()> {
        if !self.roots.contains(instance.model_name()) {
            let reason = format!("expected an instance of {}, found {}", self.root, instance.model_name());
            return Err(self.write_error(reason, value.as_ref()));
        }
        let Some((terminal, intermediates)) = self.segments.split_last() else {
            return Ok(());
        };

        let mut current: &mut dyn Model = instance;
        for segment in intermediates {
            let Slot::Nested { get, get_mut, set } = &segment.slot else {
                return Err(self.write_error(format!("'{}' cannot be navigated", segment.name), value.as_ref()));
            };
            if get(&*current).is_none() {
                if value.is_none() && null_policy == NullPolicy::None {
                    return Ok(());
                }
                let fresh = segment.factory.as_ref().map(|factory| factory()).ok_or_else(|| {
                    HqError::Instantiation {
                        type_name: segment.resolved.to_string(),
                        path: self.path.clone(),
                    }
                })?;
                set(&mut *current, Some(fresh)).map_err(|reason| self.write_error(reason, value.as_ref()))?;
            }
            current = match get_mut(current) {
                Some(next) => next,
                None => {
                    let reason = format!("'{}' stayed absent after initialization", segment.name);
                    return Err(self.write_error(reason, value.as_ref()));
                }
            };
        }

        match &terminal.slot {
            Slot::Leaf { set, .. } => {
                let value = match &terminal.resolved {
                    PropertyType::Collection(kind)
                        if null_policy == NullPolicy::InitializeCollection
                            || (collection_policy == CollectionPolicy::Copy && value.is_some()) =>
                    {
                        match value {
                            Some(value) => Some(coerce(value, *kind)?),
                            None => Some(empty_collection(*kind)),
                        }
                    }
                    _ => value,
                };
                let shown = value.clone();
                set(current, value).map_err(|reason| self.write_error(reason, shown.as_ref()))
            }
            Slot::Nested { set, .. } => match value {
                None => set(current, None).map_err(|reason| self.write_error(reason, None)),
                Some(Value::Model(model)) => {
                    let accepted = terminal
                        .accepts
                        .as_ref()
                        .map_or(false, |names| names.contains(model.get().model_name()));
                    if !accepted {
                        let reason = format!(
                            "{} is not assignable to {}",
                            model.get().model_name(),
                            terminal.resolved
                        );
                        return Err(self.write_error(reason, Some(&Value::Model(model))));
                    }
                    let shown = Value::Model(model.clone());
                    set(current, Some(model.into_inner()))
                        .map_err(|reason| self.write_error(reason, Some(&shown)))
                }
                Some(other) => {
                    let reason = format!("expected a {} model, found {}", terminal.resolved, other.kind_name());
                    Err(self.write_error(reason, Some(&other)))
                }
            },
        }
    }

    fn write_error(&self, reason: impl Into<String>, value: Option<&Value>) -> HqError {
        let shown = value.map_or_else(|| "absent".to_string(), |v| v.to_string());
        HqError::PropertyWrite {
            path: self.path.clone(),
            root: self.root.clone(),
            reason: format!("{} (value: {})", reason.into(), shown),
        }
    }

    pub fn root_type(&self) -> &str {
        &self.root
    }

    /// Path string as given at compile time
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the terminal property
    pub fn property_name(&self) -> &str {
        self.segments.last().map_or("", |s| s.name.as_str())
    }

    /// Resolved type of the terminal property
    pub fn property_type(&self) -> Option<&PropertyType> {
        self.segments.last().map(|s| &s.resolved)
    }

    /// Type declaring the terminal property
    pub fn property_parent_type(&self) -> &str {
        self.segments.last().map_or(self.root.as_str(), |s| s.owner.as_str())
    }

    /// Names of every segment but the last, joined with `.`
    pub fn property_parent_path(&self) -> String {
        let parents = self.segments.len().saturating_sub(1);
        self.segments[..parents]
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl PartialEq for PathAccessor {
    fn eq(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| {
                a.owner == b.owner && a.name == b.name && a.resolved == b.resolved
            })
    }
}

impl Eq for PathAccessor {}

impl Hash for PathAccessor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for segment in &self.segments {
            segment.owner.hash(state);
            segment.name.hash(state);
            segment.resolved.hash(state);
        }
    }
}

impl fmt::Debug for PathAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathAccessor")
            .field("root", &self.root)
            .field("path", &self.path)
            .field("segments", &self.segments)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::BTreeSet;

    fn accessor(path: &str) -> PathAccessor {
        PathAccessor::new(&registry(), path, "Person").unwrap()
    }

    fn hash_of(accessor: &PathAccessor) -> u64 {
        let mut hasher = DefaultHasher::new();
        accessor.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_compile_metadata() {
        let acc = accessor("address.country.code");
        assert_eq!(acc.len(), 3);
        assert_eq!(acc.root_type(), "Person");
        assert_eq!(acc.property_name(), "code");
        assert_eq!(acc.property_parent_type(), "Country");
        assert_eq!(acc.property_parent_path(), "address.country");
        assert_eq!(acc.segments()[0].owner(), "Person");
        assert_eq!(
            acc.property_type(),
            Some(&PropertyType::Scalar(hq_core::ScalarKind::Text))
        );
    }

    #[test]
    fn test_compile_errors() {
        let registry = registry();
        let missing = PathAccessor::new(&registry, "address.street", "Person").unwrap_err();
        assert!(matches!(missing, HqError::Compilation { .. }));

        let scalar = PathAccessor::new(&registry, "age.value", "Person").unwrap_err();
        assert!(matches!(scalar, HqError::Compilation { .. }));

        let unknown = PathAccessor::new(&registry, "name", "Ghost").unwrap_err();
        assert!(matches!(unknown, HqError::Compilation { .. }));

        let empty = PathAccessor::new(&registry, "address..city", "Person").unwrap_err();
        assert!(matches!(empty, HqError::Compilation { .. }));

        // Rock has no constructor
        let rock = PathAccessor::new(&registry, "weight", "Rock").unwrap_err();
        assert!(matches!(rock, HqError::Instantiation { .. }));

        // Animal is abstract, so discovery cannot continue past it
        let abstract_pet = PathAccessor::new(&registry, "pet.name", "Person").unwrap_err();
        assert!(matches!(abstract_pet, HqError::Instantiation { .. }));
    }

    #[test]
    fn test_explicit_type_override() {
        let registry = registry();
        let separator = Regex::new(r"\.").unwrap();

        let mut explicit = BTreeMap::new();
        explicit.insert(0, PropertyType::model("Dog"));
        let acc = PathAccessor::compile(&registry, "pet.name", &separator, "Person", &explicit).unwrap();
        assert_eq!(acc.segments()[0].declared_type(), &PropertyType::model("Animal"));
        assert_eq!(acc.segments()[0].resolved_type(), &PropertyType::model("Dog"));

        let mut person = Person::default();
        acc.set_default(&mut person, Some(Value::from("Rex"))).unwrap();
        assert_eq!(acc.get(&person), Some(Value::from("Rex")));

        let mut wrong = BTreeMap::new();
        wrong.insert(0, PropertyType::model("Rock"));
        let err = PathAccessor::compile(&registry, "pet.name", &separator, "Person", &wrong).unwrap_err();
        assert!(matches!(err, HqError::TypeMismatch { segment: 0, .. }));
    }

    #[test]
    fn test_round_trip() {
        let acc = accessor("address.city");
        let mut person = Person::default();
        acc.set_default(&mut person, Some(Value::from("Oslo"))).unwrap();
        assert_eq!(acc.get(&person), Some(Value::from("Oslo")));
        assert_eq!(acc.read::<String>(&person), Some("Oslo".to_string()));
        assert_eq!(person.address.as_ref().and_then(|a| a.city.as_deref()), Some("Oslo"));

        let age = accessor("age");
        age.set_default(&mut person, Some(Value::Int(41))).unwrap();
        assert_eq!(person.age, 41);
    }

    #[test]
    fn test_read_is_best_effort() {
        let person = Person::default();
        assert_eq!(accessor("address.country.code").get(&person), None);
        assert_eq!(accessor("address.city").get(&Dog::default()), None);
    }

    #[test]
    fn test_absent_write_leaves_intermediates_alone() {
        let acc = accessor("address.city");
        let mut person = Person::default();
        acc.set(&mut person, None, NullPolicy::None, CollectionPolicy::Copy).unwrap();
        assert!(person.address.is_none());

        acc.set(&mut person, None, NullPolicy::Initialize, CollectionPolicy::Copy).unwrap();
        assert_eq!(person.address, Some(Address::default()));
    }

    #[test]
    fn test_collection_coercion_on_write() {
        let acc = accessor("tags");
        let mut person = Person::default();
        let source = Value::List(vec![Value::from("b"), Value::from("a"), Value::from("b")]);
        acc.set_default(&mut person, Some(source.clone())).unwrap();
        assert_eq!(person.tags, BTreeSet::from(["a".to_string(), "b".to_string()]));

        // Without copying the list is not a sorted set
        let err = acc
            .set(&mut person, Some(source), NullPolicy::None, CollectionPolicy::None)
            .unwrap_err();
        assert!(matches!(err, HqError::PropertyWrite { .. }));

        acc.set(&mut person, None, NullPolicy::InitializeCollection, CollectionPolicy::None)
            .unwrap();
        assert!(person.tags.is_empty());

        let scalar = acc
            .set(&mut person, Some(Value::Int(1)), NullPolicy::None, CollectionPolicy::Copy)
            .unwrap_err();
        assert!(matches!(scalar, HqError::UnsupportedCollectionKind { .. }));
    }

    #[test]
    fn test_model_terminal() {
        let acc = accessor("pet");
        let mut person = Person::default();
        acc.set_default(&mut person, Some(Value::model(Dog { name: Some("Rex".into()) })))
            .unwrap();
        assert_eq!(acc.get(&person), Some(Value::model(Dog { name: Some("Rex".into()) })));

        let err = acc
            .set_default(&mut person, Some(Value::model(Rock::default())))
            .unwrap_err();
        assert!(matches!(err, HqError::PropertyWrite { .. }));

        acc.set_default(&mut person, None).unwrap();
        assert!(person.pet.is_none());
    }

    #[test]
    fn test_write_errors() {
        let acc = accessor("age");
        let mut person = Person::default();
        let err = acc.set_default(&mut person, None).unwrap_err();
        assert!(matches!(err, HqError::PropertyWrite { ref path, .. } if path == "age"));

        let err = acc
            .set_default(&mut person, Some(Value::from("old")))
            .unwrap_err();
        assert_eq!(err.error_code(), "property_write_failed");

        let mut dog = Dog::default();
        assert!(acc.set_default(&mut dog, Some(Value::Int(3))).is_err());
    }

    #[test]
    fn test_equality_ignores_separator() {
        let registry = registry();
        let dotted = PathAccessor::new(&registry, "address.city", "Person").unwrap();
        let slash = Regex::new("/").unwrap();
        let slashed =
            PathAccessor::compile(&registry, "address/city", &slash, "Person", &BTreeMap::new()).unwrap();
        assert_eq!(dotted, slashed);
        assert_eq!(hash_of(&dotted), hash_of(&slashed));
        assert_ne!(dotted, accessor("address.zip"));
    }

    #[test]
    fn test_with_config() {
        let defaults = PathDefaults {
            separator: "/".to_string(),
            null_policy: NullPolicy::None,
            collection_policy: CollectionPolicy::None,
        };
        let acc = PathAccessor::with_config(&registry(), "address/zip", "Person", &defaults).unwrap();
        let mut person = Person::default();
        acc.set_default(&mut person, Some(Value::Int(1234))).unwrap();
        assert_eq!(person.address.and_then(|a| a.zip), Some(1234));
    }
}

//! Model schema registry
//!
//! Every type a property path can walk through is described once: its name,
//! its supertypes, an optional zero-argument constructor, and one typed
//! accessor pair per property. Paths are compiled against these
//! descriptions instead of discovering fields at runtime.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use hq_core::{
    downcast_model, Describe, HqError, HqResult, Model, ModelBox, PropertyType, PropertyValue,
    Value,
};
use tracing::debug;

pub type Factory = Arc<dyn Fn() -> Box<dyn Model> + Send + Sync>;
pub type ValueGetter = Arc<dyn Fn(&dyn Model) -> Option<Value> + Send + Sync>;
pub type ValueSetter = Arc<dyn Fn(&mut dyn Model, Option<Value>) -> Result<(), String> + Send + Sync>;
pub type NestedGetter = Arc<dyn for<'a> Fn(&'a dyn Model) -> Option<&'a dyn Model> + Send + Sync>;
pub type NestedGetterMut =
    Arc<dyn for<'a> Fn(&'a mut dyn Model) -> Option<&'a mut dyn Model> + Send + Sync>;
pub type NestedSetter =
    Arc<dyn Fn(&mut dyn Model, Option<Box<dyn Model>>) -> Result<(), String> + Send + Sync>;

/// How a property is read and written
#[derive(Clone)]
pub enum Slot {
    /// Scalar or collection value
    Leaf { get: ValueGetter, set: ValueSetter },
    /// Optional nested model
    Nested {
        get: NestedGetter,
        get_mut: NestedGetterMut,
        set: NestedSetter,
    },
}

/// A named property of a model type
#[derive(Clone)]
pub struct Property {
    name: String,
    declared: PropertyType,
    slot: Slot,
}

impl Property {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared_type(&self) -> &PropertyType {
        &self.declared
    }

    pub fn slot(&self) -> &Slot {
        &self.slot
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .finish()
    }
}

/// Description of one registered model type
pub struct ModelType {
    name: String,
    supertypes: Vec<String>,
    factory: Option<Factory>,
    properties: Vec<Property>,
}

impl ModelType {
    /// Describe a concrete type
    pub fn builder<T: Describe>() -> ModelTypeBuilder<T> {
        ModelTypeBuilder {
            ty: ModelType {
                name: T::MODEL_NAME.to_string(),
                supertypes: Vec::new(),
                factory: None,
                properties: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// A type that can be declared and extended but never instantiated
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            factory: None,
            properties: Vec::new(),
        }
    }

    pub fn with_supertype(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    pub fn is_instantiable(&self) -> bool {
        self.factory.is_some()
    }

    pub fn instantiate(&self) -> Option<Box<dyn Model>> {
        self.factory.as_ref().map(|factory| factory())
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("supertypes", &self.supertypes)
            .field("instantiable", &self.is_instantiable())
            .field("properties", &self.properties)
            .finish()
    }
}

fn nested_getter<F>(f: F) -> NestedGetter
where
    F: for<'a> Fn(&'a dyn Model) -> Option<&'a dyn Model> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn nested_getter_mut<F>(f: F) -> NestedGetterMut
where
    F: for<'a> Fn(&'a mut dyn Model) -> Option<&'a mut dyn Model> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn owner_mismatch(expected: &str, found: &str) -> String {
    format!("expected an instance of {}, found {}", expected, found)
}

/// Fluent description of a concrete model type
pub struct ModelTypeBuilder<T: Describe> {
    ty: ModelType,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Describe> ModelTypeBuilder<T> {
    /// Zero-argument constructor used for trial and on-demand instantiation
    pub fn constructor(mut self, constructor: fn() -> T) -> Self {
        self.ty.factory = Some(Arc::new(move || Box::new(constructor()) as Box<dyn Model>));
        self
    }

    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.ty.supertypes.push(supertype.into());
        self
    }

    /// Scalar or collection property
    pub fn value<V, G, M>(mut self, name: &str, get: G, get_mut: M) -> Self
    where
        V: PropertyValue + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        let getter: ValueGetter = Arc::new(move |model: &dyn Model| {
            model
                .as_any()
                .downcast_ref::<T>()
                .and_then(|owner| get(owner).to_value())
        });
        let setter: ValueSetter = Arc::new(move |model: &mut dyn Model, value: Option<Value>| {
            let found = model.model_name();
            let owner = model
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or_else(|| owner_mismatch(T::MODEL_NAME, found))?;
            *get_mut(owner) = V::from_value(value)?;
            Ok(())
        });
        self.ty.properties.push(Property {
            name: name.to_string(),
            declared: V::property_type(),
            slot: Slot::Leaf {
                get: getter,
                set: setter,
            },
        });
        self
    }

    /// Optional nested model of a concrete type
    pub fn nested<N, G, M>(mut self, name: &str, get: G, get_mut: M) -> Self
    where
        N: Describe,
        G: Fn(&T) -> &Option<N> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<N> + Send + Sync + 'static,
    {
        let get_mut = Arc::new(get_mut);
        let target = Arc::clone(&get_mut);
        let setter: NestedSetter = Arc::new(move |model: &mut dyn Model, value: Option<Box<dyn Model>>| {
            let found = model.model_name();
            let owner = model
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or_else(|| owner_mismatch(T::MODEL_NAME, found))?;
            *(*target)(owner) = match value {
                None => None,
                Some(boxed) => {
                    let found = boxed.model_name();
                    Some(downcast_model::<N>(boxed).ok_or_else(|| owner_mismatch(N::MODEL_NAME, found))?)
                }
            };
            Ok(())
        });
        self.ty.properties.push(Property {
            name: name.to_string(),
            declared: PropertyType::model(N::MODEL_NAME),
            slot: Slot::Nested {
                get: nested_getter(move |model| {
                    model
                        .as_any()
                        .downcast_ref::<T>()
                        .and_then(|owner| get(owner).as_ref())
                        .map(|nested| nested as &dyn Model)
                }),
                get_mut: nested_getter_mut(move |model| {
                    model
                        .as_any_mut()
                        .downcast_mut::<T>()
                        .and_then(|owner| (*get_mut)(owner).as_mut())
                        .map(|nested| nested as &mut dyn Model)
                }),
                set: setter,
            },
        });
        self
    }

    /// Optional nested model declared as an abstract or supertype
    pub fn nested_dyn<G, M>(mut self, name: &str, declared: &str, get: G, get_mut: M) -> Self
    where
        G: Fn(&T) -> &Option<ModelBox> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<ModelBox> + Send + Sync + 'static,
    {
        let get_mut = Arc::new(get_mut);
        let target = Arc::clone(&get_mut);
        let setter: NestedSetter = Arc::new(move |model: &mut dyn Model, value: Option<Box<dyn Model>>| {
            let found = model.model_name();
            let owner = model
                .as_any_mut()
                .downcast_mut::<T>()
                .ok_or_else(|| owner_mismatch(T::MODEL_NAME, found))?;
            *(*target)(owner) = value.map(ModelBox::new);
            Ok(())
        });
        self.ty.properties.push(Property {
            name: name.to_string(),
            declared: PropertyType::model(declared),
            slot: Slot::Nested {
                get: nested_getter(move |model| {
                    model
                        .as_any()
                        .downcast_ref::<T>()
                        .and_then(|owner| get(owner).as_ref())
                        .map(ModelBox::get)
                }),
                get_mut: nested_getter_mut(move |model| {
                    model
                        .as_any_mut()
                        .downcast_mut::<T>()
                        .and_then(|owner| (*get_mut)(owner).as_mut())
                        .map(ModelBox::get_mut)
                }),
                set: setter,
            },
        });
        self
    }

    pub fn build(self) -> ModelType {
        self.ty
    }
}

/// Registry of model types, keyed by name
#[derive(Default, Clone)]
pub struct SchemaRegistry {
    types: HashMap<String, Arc<ModelType>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ty: ModelType) -> &mut Self {
        debug!(
            model = %ty.name,
            properties = ty.properties.len(),
            instantiable = ty.is_instantiable(),
            "registered model type"
        );
        self.types.insert(ty.name.clone(), Arc::new(ty));
        self
    }

    /// Register a type (builder pattern)
    pub fn with(mut self, ty: ModelType) -> Self {
        self.register(ty);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ModelType>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Whether `name` is `ancestor` or extends it, directly or transitively
    pub fn is_subtype(&self, name: &str, ancestor: &str) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            if current == ancestor {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(ty) = self.types.get(&current) {
                queue.extend(ty.supertypes.iter().cloned());
            }
        }
        false
    }

    /// Whether a value of type `provided` may be stored where `declared` is expected
    pub fn is_assignable(&self, provided: &PropertyType, declared: &PropertyType) -> bool {
        match (provided, declared) {
            (PropertyType::Model(provided), PropertyType::Model(declared)) => {
                self.is_subtype(provided, declared)
            }
            (provided, declared) => provided == declared,
        }
    }

    /// Names of every registered type assignable to `name`, itself included
    pub fn subtypes_of(&self, name: &str) -> HashSet<String> {
        let mut names: HashSet<String> = self
            .types
            .keys()
            .filter(|candidate| self.is_subtype(candidate, name))
            .cloned()
            .collect();
        names.insert(name.to_string());
        names
    }

    /// Instantiate a registered type through its constructor
    pub fn instantiate(&self, name: &str, path: &str) -> HqResult<Box<dyn Model>> {
        self.types
            .get(name)
            .and_then(|ty| ty.instantiate())
            .ok_or_else(|| HqError::Instantiation {
                type_name: name.to_string(),
                path: path.to_string(),
            })
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort();
        f.debug_struct("SchemaRegistry").field("types", &names).finish()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use hq_core::{CollectionKind, ScalarKind};

    #[test]
    fn test_registry_lookup() {
        let registry = registry();
        assert!(registry.contains("Person"));
        assert!(!registry.contains("Cat"));

        let person = registry.get("Person").unwrap();
        assert!(person.is_instantiable());
        assert_eq!(
            person.property("age").unwrap().declared_type(),
            &PropertyType::Scalar(ScalarKind::Int)
        );
        assert_eq!(
            person.property("tags").unwrap().declared_type(),
            &PropertyType::Collection(CollectionKind::SortedSet)
        );
        assert_eq!(
            person.property("pet").unwrap().declared_type(),
            &PropertyType::model("Animal")
        );
        assert!(person.property("missing").is_none());
    }

    #[test]
    fn test_assignability() {
        let registry = registry();
        assert!(registry.is_subtype("Dog", "Animal"));
        assert!(!registry.is_subtype("Rock", "Animal"));
        assert!(registry.is_assignable(&PropertyType::model("Dog"), &PropertyType::model("Animal")));
        assert!(!registry.is_assignable(&PropertyType::model("Animal"), &PropertyType::model("Dog")));
        assert!(!registry.is_assignable(
            &PropertyType::Collection(CollectionKind::List),
            &PropertyType::Collection(CollectionKind::Set)
        ));

        let animals = registry.subtypes_of("Animal");
        assert!(animals.contains("Dog"));
        assert!(animals.contains("Animal"));
        assert!(!animals.contains("Rock"));
    }

    #[test]
    fn test_transitive_supertypes() {
        let registry = SchemaRegistry::new()
            .with(ModelType::abstract_type("Thing"))
            .with(ModelType::abstract_type("Animal").with_supertype("Thing"))
            .with(ModelType::builder::<Dog>().extends("Animal").build());
        assert!(registry.is_subtype("Dog", "Thing"));
    }

    #[test]
    fn test_instantiate() {
        let registry = registry();
        let person = registry.instantiate("Person", "").unwrap();
        assert_eq!(person.model_name(), "Person");

        let err = registry.instantiate("Animal", "pet.name").unwrap_err();
        assert!(matches!(err, HqError::Instantiation { ref type_name, .. } if type_name == "Animal"));
        assert!(registry.instantiate("Rock", "").is_err());
    }
}

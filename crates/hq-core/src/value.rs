//! Dynamic values
//!
//! `Value` is what flows through condition parameters, result rows and
//! property writes. It never represents "absent": absence is `Option::None`
//! at every boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::traits::Model;
use crate::types::{CollectionKind, PropertyType, ScalarKind};

/// Owned, clonable handle to an erased model
pub struct ModelBox(Box<dyn Model>);

impl ModelBox {
    pub fn new(model: Box<dyn Model>) -> Self {
        Self(model)
    }

    pub fn get(&self) -> &dyn Model {
        self.0.as_ref()
    }

    pub fn get_mut(&mut self) -> &mut dyn Model {
        self.0.as_mut()
    }

    pub fn into_inner(self) -> Box<dyn Model> {
        self.0
    }
}

impl PartialEq for ModelBox {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_model(other.get())
    }
}

impl Clone for ModelBox {
    fn clone(&self) -> Self {
        Self(self.0.clone_model())
    }
}

impl fmt::Debug for ModelBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

/// A dynamically typed value
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    Array(Vec<Value>),
    List(Vec<Value>),
    Set(HashSet<Value>),
    SortedSet(BTreeSet<Value>),
    Map(HashMap<Value, Value>),
    SortedMap(BTreeMap<Value, Value>),
    OrderedMap(Vec<(Value, Value)>),
    Model(ModelBox),
}

impl Value {
    pub fn model(model: impl Model) -> Self {
        Self::Model(ModelBox::new(Box::new(model)))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Uuid(_) => "uuid",
            Self::Model(_) => "model",
            other => other
                .collection_kind()
                .map(|kind| kind.as_str())
                .unwrap_or("collection"),
        }
    }

    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            Self::Array(_) => Some(CollectionKind::Array),
            Self::List(_) => Some(CollectionKind::List),
            Self::Set(_) => Some(CollectionKind::Set),
            Self::SortedSet(_) => Some(CollectionKind::SortedSet),
            Self::Map(_) => Some(CollectionKind::Map),
            Self::SortedMap(_) => Some(CollectionKind::SortedMap),
            Self::OrderedMap(_) => Some(CollectionKind::OrderedMap),
            _ => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.collection_kind().is_some()
    }

    /// Array, list or set
    pub fn is_sequence(&self) -> bool {
        self.collection_kind().is_some_and(|kind| !kind.is_map())
    }

    pub fn is_map(&self) -> bool {
        self.collection_kind().is_some_and(|kind| kind.is_map())
    }

    /// Number of elements or entries of a collection
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Array(items) | Self::List(items) => Some(items.len()),
            Self::Set(items) => Some(items.len()),
            Self::SortedSet(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            Self::SortedMap(entries) => Some(entries.len()),
            Self::OrderedMap(entries) => Some(entries.len()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&dyn Model> {
        match self {
            Self::Model(model) => Some(model.get()),
            _ => None,
        }
    }

    /// Elements of a sequence, in iteration order; non-sequences are handed back
    pub fn into_elements(self) -> Result<Vec<Value>, Value> {
        match self {
            Self::Array(items) | Self::List(items) => Ok(items),
            Self::Set(items) => Ok(items.into_iter().collect()),
            Self::SortedSet(items) => Ok(items.into_iter().collect()),
            other => Err(other),
        }
    }

    /// Entries of a map, in iteration order; non-maps are handed back
    pub fn into_entries(self) -> Result<Vec<(Value, Value)>, Value> {
        match self {
            Self::Map(entries) => Ok(entries.into_iter().collect()),
            Self::SortedMap(entries) => Ok(entries.into_iter().collect()),
            Self::OrderedMap(entries) => Ok(entries),
            other => Err(other),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) => 1,
            Self::Float(_) => 2,
            Self::Text(_) => 3,
            Self::Date(_) => 4,
            Self::DateTime(_) => 5,
            Self::Uuid(_) => 6,
            Self::Array(_) => 7,
            Self::List(_) => 8,
            Self::Set(_) => 9,
            Self::SortedSet(_) => 10,
            Self::Map(_) => 11,
            Self::SortedMap(_) => 12,
            Self::OrderedMap(_) => 13,
            Self::Model(_) => 14,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Self::Text(s) => Json::String(s.clone()),
            Self::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Self::DateTime(dt) => Json::String(dt.to_rfc3339()),
            Self::Uuid(u) => Json::String(u.to_string()),
            Self::Array(items) | Self::List(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Set(items) => {
                let mut sorted: Vec<&Value> = items.iter().collect();
                sorted.sort();
                Json::Array(sorted.into_iter().map(Value::to_json).collect())
            }
            Self::SortedSet(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(_) | Self::SortedMap(_) | Self::OrderedMap(_) => {
                let entries = match self.clone().into_entries() {
                    Ok(entries) => entries,
                    Err(_) => Vec::new(),
                };
                Json::Object(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_json()))
                        .collect(),
                )
            }
            Self::Model(model) => Json::String(format!("{:?}", model)),
        }
    }

    /// Convert from JSON; `null` is absent
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        use serde_json::Value as Json;
        match json {
            Json::Null => None,
            Json::Bool(b) => Some(Self::Bool(b)),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Json::String(s) => Some(Self::Text(s)),
            Json::Array(items) => Some(Self::List(
                items.into_iter().filter_map(Self::from_json).collect(),
            )),
            Json::Object(entries) => Some(Self::OrderedMap(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|v| (Self::Text(k), v)))
                    .collect(),
            )),
        }
    }
}

fn sorted_refs<'a>(items: impl Iterator<Item = &'a Value>) -> Vec<&'a Value> {
    let mut refs: Vec<&Value> = items.collect();
    refs.sort();
    refs
}

fn sorted_entries<'a>(
    entries: impl Iterator<Item = (&'a Value, &'a Value)>,
) -> Vec<(&'a Value, &'a Value)> {
    let mut refs: Vec<(&Value, &Value)> = entries.collect();
    refs.sort();
    refs
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Uuid(a), Self::Uuid(b)) => a.cmp(b),
            (Self::Array(a), Self::Array(b)) | (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Set(a), Self::Set(b)) => sorted_refs(a.iter()).cmp(&sorted_refs(b.iter())),
            (Self::SortedSet(a), Self::SortedSet(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => sorted_entries(a.iter()).cmp(&sorted_entries(b.iter())),
            (Self::SortedMap(a), Self::SortedMap(b)) => a.cmp(b),
            (Self::OrderedMap(a), Self::OrderedMap(b)) => a.cmp(b),
            (Self::Model(a), Self::Model(b)) => {
                let (a, b) = (a.get(), b.get());
                a.model_name().cmp(b.model_name()).then_with(|| {
                    if a.eq_model(b) {
                        Ordering::Equal
                    } else {
                        format!("{:?}", a).cmp(&format!("{:?}", b))
                    }
                })
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Text(s) => s.hash(state),
            Self::Date(d) => d.hash(state),
            Self::DateTime(dt) => dt.hash(state),
            Self::Uuid(u) => u.hash(state),
            Self::Array(items) | Self::List(items) => items.hash(state),
            Self::SortedSet(items) => items.hash(state),
            Self::SortedMap(entries) => entries.hash(state),
            Self::OrderedMap(entries) => entries.hash(state),
            // Unordered containers hash by size only, which stays consistent with Eq.
            Self::Set(items) => items.len().hash(state),
            Self::Map(entries) => entries.len().hash(state),
            Self::Model(model) => model.get().model_name().hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<'a>(
            f: &mut fmt::Formatter<'_>,
            items: impl Iterator<Item = &'a Value>,
        ) -> fmt::Result {
            f.write_str("[")?;
            for (i, item) in items.enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", item)?;
            }
            f.write_str("]")
        }

        fn map<'a>(
            f: &mut fmt::Formatter<'_>,
            entries: impl Iterator<Item = (&'a Value, &'a Value)>,
        ) -> fmt::Result {
            f.write_str("{")?;
            for (i, (k, v)) in entries.enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: {}", k, v)?;
            }
            f.write_str("}")
        }

        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Self::Uuid(u) => write!(f, "{}", u),
            Self::Array(items) | Self::List(items) => list(f, items.iter()),
            Self::Set(items) => list(f, sorted_refs(items.iter()).into_iter()),
            Self::SortedSet(items) => list(f, items.iter()),
            Self::Map(entries) => map(f, sorted_entries(entries.iter()).into_iter()),
            Self::SortedMap(entries) => map(f, entries.iter()),
            Self::OrderedMap(entries) => map(f, entries.iter().map(|(k, v)| (k, v))),
            Self::Model(model) => write!(f, "{:?}", model),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

/// Conversion between a native field type and `Value`
///
/// The declared `property_type` is what path compilation checks explicit
/// overrides against. `from_value` only accepts the exact variant of the
/// declared kind; coercion between collection kinds happens before it.
pub trait PropertyValue: Sized {
    fn property_type() -> PropertyType;

    fn to_value(&self) -> Option<Value>;

    fn from_value(value: Option<Value>) -> Result<Self, String>;
}

fn mismatch(expected: &str, found: &Value) -> String {
    format!("expected {}, found {} {}", expected, found.kind_name(), found)
}

fn absent(expected: &str) -> String {
    format!("cannot store an absent value in a non-optional {} property", expected)
}

macro_rules! scalar_property {
    ($ty:ty, $kind:ident, $variant:ident, $label:expr) => {
        impl PropertyValue for $ty {
            fn property_type() -> PropertyType {
                PropertyType::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Option<Value> {
                Some(Value::$variant(self.clone()))
            }

            fn from_value(value: Option<Value>) -> Result<Self, String> {
                match value {
                    Some(Value::$variant(v)) => Ok(v),
                    Some(other) => Err(mismatch($label, &other)),
                    None => Err(absent($label)),
                }
            }
        }
    };
}

scalar_property!(bool, Bool, Bool, "bool");
scalar_property!(i64, Int, Int, "int");
scalar_property!(String, Text, Text, "text");
scalar_property!(NaiveDate, Date, Date, "date");
scalar_property!(DateTime<Utc>, DateTime, DateTime, "datetime");
scalar_property!(Uuid, Uuid, Uuid, "uuid");

impl PropertyValue for i32 {
    fn property_type() -> PropertyType {
        PropertyType::Scalar(ScalarKind::Int)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Int((*self).into()))
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            Some(Value::Int(i)) => {
                i32::try_from(i).map_err(|_| format!("{} does not fit a 32-bit int", i))
            }
            Some(other) => Err(mismatch("int", &other)),
            None => Err(absent("int")),
        }
    }
}

impl PropertyValue for f64 {
    fn property_type() -> PropertyType {
        PropertyType::Scalar(ScalarKind::Float)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float(*self))
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            Some(Value::Float(f)) => Ok(f),
            Some(Value::Int(i)) => Ok(i as f64),
            Some(other) => Err(mismatch("float", &other)),
            None => Err(absent("float")),
        }
    }
}

impl<T: PropertyValue> PropertyValue for Option<T> {
    fn property_type() -> PropertyType {
        T::property_type()
    }

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(T::to_value)
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            None => Ok(None),
            present => T::from_value(present).map(Some),
        }
    }
}

fn elements<T: PropertyValue, C: FromIterator<T>>(items: Vec<Value>) -> Result<C, String> {
    items
        .into_iter()
        .map(|item| T::from_value(Some(item)))
        .collect()
}

fn entries<K, V, C>(items: Vec<(Value, Value)>) -> Result<C, String>
where
    K: PropertyValue,
    V: PropertyValue,
    C: FromIterator<(K, V)>,
{
    items
        .into_iter()
        .map(|(k, v)| -> Result<(K, V), String> {
            Ok((K::from_value(Some(k))?, V::from_value(Some(v))?))
        })
        .collect()
}

impl<T: PropertyValue> PropertyValue for Vec<T> {
    fn property_type() -> PropertyType {
        PropertyType::Collection(CollectionKind::List)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::List(self.iter().filter_map(T::to_value).collect()))
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            Some(Value::List(items)) => elements::<T, _>(items),
            Some(other) => Err(mismatch("list", &other)),
            None => Err(absent("list")),
        }
    }
}

impl<T: PropertyValue> PropertyValue for Box<[T]> {
    fn property_type() -> PropertyType {
        PropertyType::Collection(CollectionKind::Array)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Array(self.iter().filter_map(T::to_value).collect()))
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            Some(Value::Array(items)) => elements::<T, Vec<T>>(items).map(Vec::into_boxed_slice),
            Some(other) => Err(mismatch("array", &other)),
            None => Err(absent("array")),
        }
    }
}

impl<T: PropertyValue + Eq + Hash> PropertyValue for HashSet<T> {
    fn property_type() -> PropertyType {
        PropertyType::Collection(CollectionKind::Set)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Set(self.iter().filter_map(T::to_value).collect()))
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            Some(Value::Set(items)) => elements::<T, _>(items.into_iter().collect()),
            Some(other) => Err(mismatch("set", &other)),
            None => Err(absent("set")),
        }
    }
}

impl<T: PropertyValue + Ord> PropertyValue for BTreeSet<T> {
    fn property_type() -> PropertyType {
        PropertyType::Collection(CollectionKind::SortedSet)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::SortedSet(self.iter().filter_map(T::to_value).collect()))
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            Some(Value::SortedSet(items)) => elements::<T, _>(items.into_iter().collect()),
            Some(other) => Err(mismatch("sorted_set", &other)),
            None => Err(absent("sorted_set")),
        }
    }
}

impl<K, V> PropertyValue for HashMap<K, V>
where
    K: PropertyValue + Eq + Hash,
    V: PropertyValue,
{
    fn property_type() -> PropertyType {
        PropertyType::Collection(CollectionKind::Map)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::Map(
            self.iter()
                .filter_map(|(k, v)| Some((k.to_value()?, v.to_value()?)))
                .collect(),
        ))
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            Some(Value::Map(items)) => entries::<K, V, _>(items.into_iter().collect()),
            Some(other) => Err(mismatch("map", &other)),
            None => Err(absent("map")),
        }
    }
}

impl<K, V> PropertyValue for BTreeMap<K, V>
where
    K: PropertyValue + Ord,
    V: PropertyValue,
{
    fn property_type() -> PropertyType {
        PropertyType::Collection(CollectionKind::SortedMap)
    }

    fn to_value(&self) -> Option<Value> {
        Some(Value::SortedMap(
            self.iter()
                .filter_map(|(k, v)| Some((k.to_value()?, v.to_value()?)))
                .collect(),
        ))
    }

    fn from_value(value: Option<Value>) -> Result<Self, String> {
        match value {
            Some(Value::SortedMap(items)) => entries::<K, V, _>(items.into_iter().collect()),
            Some(other) => Err(mismatch("sorted_map", &other)),
            None => Err(absent("sorted_map")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_across_kinds() {
        assert!(Value::Bool(true) < Value::Int(0));
        assert!(Value::Int(2) < Value::Int(10));
        assert!(Value::Float(-0.5) < Value::Float(0.5));
        assert_eq!(Value::Float(1.5), Value::Float(1.5));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_unordered_set_equality() {
        let a = Value::Set([Value::Int(1), Value::Int(2)].into_iter().collect());
        let b = Value::Set([Value::Int(2), Value::Int(1)].into_iter().collect());
        assert_eq!(a, b);

        let mut outer = HashSet::new();
        outer.insert(a);
        assert!(outer.contains(&b));
    }

    #[test]
    fn test_display() {
        let list = Value::List(vec![Value::from("a"), Value::from(3)]);
        assert_eq!(list.to_string(), "[a, 3]");
        let date = Value::from(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(date.to_string(), "2024-03-09");
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"name": "Ada", "tags": ["x", null], "age": 36});
        let value = Value::from_json(json).unwrap();
        let Value::OrderedMap(entries) = &value else {
            panic!("expected an ordered map");
        };
        assert_eq!(entries.len(), 3);
        let tags = entries
            .iter()
            .find(|(k, _)| k.as_str() == Some("tags"))
            .map(|(_, v)| v.clone())
            .unwrap();
        assert_eq!(tags.len(), Some(1));

        assert_eq!(Value::Int(4).to_json(), serde_json::json!(4));
        assert_eq!(
            serde_json::to_string(&Value::List(vec![Value::Bool(true)])).unwrap(),
            "[true]"
        );
    }

    #[test]
    fn test_into_elements_and_entries() {
        let list = Value::List(vec![Value::Int(1)]);
        assert_eq!(list.into_elements().unwrap(), vec![Value::Int(1)]);
        assert!(Value::Int(1).into_elements().is_err());

        let map = Value::OrderedMap(vec![(Value::from("k"), Value::Int(1))]);
        assert_eq!(map.into_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_property_value_scalars() {
        assert_eq!(String::from_value(Some(Value::from("x"))).unwrap(), "x");
        assert!(String::from_value(Some(Value::Int(1))).is_err());
        assert!(String::from_value(None).is_err());
        assert_eq!(Option::<String>::from_value(None).unwrap(), None);
        assert_eq!(f64::from_value(Some(Value::Int(2))).unwrap(), 2.0);
        assert!(i32::from_value(Some(Value::Int(i64::MAX))).is_err());
        assert_eq!(
            <Option<i64>>::property_type(),
            PropertyType::Scalar(ScalarKind::Int)
        );
    }

    #[test]
    fn test_property_value_collections() {
        let tags: BTreeSet<String> = ["b".to_string(), "a".to_string()].into_iter().collect();
        let value = tags.to_value().unwrap();
        assert!(matches!(value, Value::SortedSet(_)));
        assert_eq!(BTreeSet::<String>::from_value(Some(value)).unwrap(), tags);

        let list = Value::List(vec![Value::from("a")]);
        assert!(HashSet::<String>::from_value(Some(list)).is_err());

        let map = Value::Map(
            [(Value::from("a"), Value::Int(1))].into_iter().collect(),
        );
        let parsed: HashMap<String, i64> = HashMap::from_value(Some(map)).unwrap();
        assert_eq!(parsed.get("a"), Some(&1));
    }
}

//! Collection coercion
//!
//! Copies a collection value into a fresh collection of the declared kind
//! before it is written through a path.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use hq_core::{CollectionKind, HqError, HqResult, Value};

/// Copy `value` into a new collection of `kind`
///
/// Sequences (array, list, set, sorted set) convert into sequence kinds and
/// maps (map, sorted map, ordered map) into map kinds. Array, list and
/// ordered-map targets keep the source iteration order.
pub fn coerce(value: Value, kind: CollectionKind) -> HqResult<Value> {
    let unsupported = |found: &Value| HqError::UnsupportedCollectionKind {
        found: found.kind_name().to_string(),
        target: kind.as_str().to_string(),
    };

    if kind.is_map() {
        let entries = value.into_entries().map_err(|v| unsupported(&v))?;
        return Ok(match kind {
            CollectionKind::Map => {
                let mut map = HashMap::with_capacity(entries.len());
                map.extend(entries);
                Value::Map(map)
            }
            CollectionKind::SortedMap => Value::SortedMap(entries.into_iter().collect::<BTreeMap<_, _>>()),
            _ => Value::OrderedMap(entries),
        });
    }

    let items = value.into_elements().map_err(|v| unsupported(&v))?;
    Ok(match kind {
        CollectionKind::Array => Value::Array(items),
        CollectionKind::List => Value::List(items),
        CollectionKind::Set => {
            let mut set = HashSet::with_capacity(items.len());
            set.extend(items);
            Value::Set(set)
        }
        _ => Value::SortedSet(items.into_iter().collect::<BTreeSet<_>>()),
    })
}

/// Empty collection of the given kind
pub fn empty_collection(kind: CollectionKind) -> Value {
    match kind {
        CollectionKind::Array => Value::Array(Vec::new()),
        CollectionKind::List => Value::List(Vec::new()),
        CollectionKind::Set => Value::Set(HashSet::new()),
        CollectionKind::SortedSet => Value::SortedSet(BTreeSet::new()),
        CollectionKind::Map => Value::Map(HashMap::new()),
        CollectionKind::SortedMap => Value::SortedMap(BTreeMap::new()),
        CollectionKind::OrderedMap => Value::OrderedMap(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Value {
        Value::List(items.iter().map(|s| Value::from(*s)).collect())
    }

    #[test]
    fn test_sequence_targets() {
        let sorted = coerce(list(&["b", "a", "b"]), CollectionKind::SortedSet).unwrap();
        assert_eq!(
            sorted,
            Value::SortedSet(["a", "b"].iter().map(|s| Value::from(*s)).collect())
        );

        let set = coerce(list(&["b", "a", "b"]), CollectionKind::Set).unwrap();
        assert_eq!(set.len(), Some(2));

        let array = coerce(list(&["z", "y"]), CollectionKind::Array).unwrap();
        assert_eq!(array, Value::Array(vec![Value::from("z"), Value::from("y")]));
    }

    #[test]
    fn test_map_targets_keep_order() {
        let source = Value::OrderedMap(vec![
            (Value::from("z"), Value::Int(1)),
            (Value::from("a"), Value::Int(2)),
        ]);
        let ordered = coerce(source.clone(), CollectionKind::OrderedMap).unwrap();
        assert_eq!(ordered, source);

        let sorted = coerce(source, CollectionKind::SortedMap).unwrap();
        match sorted {
            Value::SortedMap(map) => {
                let keys: Vec<_> = map.keys().cloned().collect();
                assert_eq!(keys, vec![Value::from("a"), Value::from("z")]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_sources() {
        let err = coerce(Value::Int(3), CollectionKind::List).unwrap_err();
        assert!(matches!(
            err,
            HqError::UnsupportedCollectionKind { ref found, ref target } if found == "int" && target == "list"
        ));

        assert!(coerce(list(&["a"]), CollectionKind::Map).is_err());
        assert!(coerce(Value::Map(HashMap::new()), CollectionKind::List).is_err());
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(empty_collection(CollectionKind::List), Value::List(Vec::new()));
        assert_eq!(empty_collection(CollectionKind::SortedMap).len(), Some(0));
    }
}

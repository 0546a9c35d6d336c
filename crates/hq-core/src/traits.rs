//! Core traits for objects addressed by property paths
//!
//! A `Model` is any registered object type a path can walk through. Concrete
//! types opt in by implementing `Describe`; the blanket impl provides the
//! type-erased plumbing.

use std::any::Any;
use std::fmt;

/// A type-erased object that property paths can read and write
pub trait Model: Any + Send + Sync + fmt::Debug + 'static {
    /// Registered type name
    fn model_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_model(&self) -> Box<dyn Model>;

    /// Structural equality across erased models of possibly different types
    fn eq_model(&self, other: &dyn Model) -> bool;
}

/// Opt-in trait for concrete model types
///
/// ```ignore
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Person { name: String }
///
/// impl Describe for Person {
///     const MODEL_NAME: &'static str = "Person";
/// }
/// ```
pub trait Describe: Any + Clone + PartialEq + fmt::Debug + Send + Sync {
    const MODEL_NAME: &'static str;
}

impl<T: Describe> Model for T {
    fn model_name(&self) -> &'static str {
        T::MODEL_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_model(&self) -> Box<dyn Model> {
        Box::new(self.clone())
    }

    fn eq_model(&self, other: &dyn Model) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// Downcast an erased model to a concrete type
pub fn downcast_model<T: Describe>(model: Box<dyn Model>) -> Option<T> {
    model.into_any().downcast::<T>().ok().map(|concrete| *concrete)
}

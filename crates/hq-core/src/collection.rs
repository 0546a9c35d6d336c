//! Element collections
//!
//! Eager functional combinators over an ordered sequence. Each combinator
//! walks the backing rows once; reconstructing combinators materialize a new
//! backing sequence through `rebuild`, so the wrapper kind survives chaining.

use rand::Rng;

use crate::error::{HqError, HqResult};

/// Functional combinators shared by list wrappers
pub trait ElementCollection<T>: Sized {
    /// Wrapper produced by reconstructing combinators
    type Rebuilt<U>: ElementCollection<U>;

    fn elements(&self) -> &[T];

    /// Factory for a fresh wrapper over new rows
    fn rebuild<U>(rows: Vec<U>) -> Self::Rebuilt<U>;

    fn size(&self) -> usize {
        self.elements().len()
    }

    fn is_empty(&self) -> bool {
        self.elements().is_empty()
    }

    fn is_defined(&self) -> bool {
        !self.is_empty()
    }

    fn map<U>(&self, f: impl FnMut(&T) -> U) -> Self::Rebuilt<U> {
        Self::rebuild(self.elements().iter().map(f).collect())
    }

    /// Map and keep only present results
    fn flat_map<U>(&self, f: impl FnMut(&T) -> Option<U>) -> Self::Rebuilt<U> {
        Self::rebuild(self.elements().iter().filter_map(f).collect())
    }

    fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Self::Rebuilt<T>
    where
        T: Clone,
    {
        Self::rebuild(
            self.elements()
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        )
    }

    /// Apply a partial function: `apply` only runs where `is_defined_at` holds
    fn collect<U>(
        &self,
        mut is_defined_at: impl FnMut(&T) -> bool,
        mut apply: impl FnMut(&T) -> U,
    ) -> Self::Rebuilt<U> {
        Self::rebuild(
            self.elements()
                .iter()
                .filter(|row| is_defined_at(row))
                .map(|row| apply(row))
                .collect(),
        )
    }

    fn fold<A>(&self, init: A, f: impl FnMut(A, &T) -> A) -> A {
        self.elements().iter().fold(init, f)
    }

    fn for_each(&self, f: impl FnMut(&T)) {
        self.elements().iter().for_each(f)
    }

    fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<&T> {
        self.elements().iter().find(|row| predicate(row))
    }

    /// Whether any row satisfies the predicate
    fn contains(&self, predicate: impl FnMut(&T) -> bool) -> bool {
        self.elements().iter().any(predicate)
    }

    fn for_all(&self, predicate: impl FnMut(&T) -> bool) -> bool {
        self.elements().iter().all(predicate)
    }

    fn head(&self) -> HqResult<&T> {
        self.head_option()
            .ok_or(HqError::EmptyCollection { operation: "head" })
    }

    fn head_option(&self) -> Option<&T> {
        self.elements().first()
    }

    fn last(&self) -> HqResult<&T> {
        self.last_option()
            .ok_or(HqError::EmptyCollection { operation: "last" })
    }

    fn last_option(&self) -> Option<&T> {
        self.elements().last()
    }

    /// All rows but the first; empty for an empty collection
    fn tail(&self) -> Self::Rebuilt<T>
    where
        T: Clone,
    {
        let rest = self.elements().get(1..).unwrap_or_default();
        Self::rebuild(rest.to_vec())
    }

    /// Uniformly random row
    fn random(&self) -> HqResult<&T> {
        let rows = self.elements();
        if rows.is_empty() {
            return Err(HqError::EmptyCollection { operation: "random" });
        }
        let mut rng = rand::rng();
        Ok(&rows[rng.random_range(0..rows.len())])
    }
}

/// Plain, non-paginated list wrapper
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListWrapper<T> {
    rows: Vec<T>,
}

impl<T> ListWrapper<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<T> {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

impl<T> From<Vec<T>> for ListWrapper<T> {
    fn from(rows: Vec<T>) -> Self {
        Self::new(rows)
    }
}

impl<T> IntoIterator for ListWrapper<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<T> ElementCollection<T> for ListWrapper<T> {
    type Rebuilt<U> = ListWrapper<U>;

    fn elements(&self) -> &[T] {
        &self.rows
    }

    fn rebuild<U>(rows: Vec<U>) -> ListWrapper<U> {
        ListWrapper::new(rows)
    }
}

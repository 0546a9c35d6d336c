//! Pagination types
//!
//! A `PageWindow` selects a slice of a logically larger result; a
//! `PaginatedResult` carries that slice together with its offset and the
//! total size the source reported.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::collection::ElementCollection;
use crate::error::{HqError, HqResult};

/// Offset/size pair describing the materialized slice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub start: usize,
    pub size: usize,
}

impl PageWindow {
    pub fn new(start: usize, size: usize) -> Self {
        Self { start, size }
    }

    /// Every row
    pub fn all() -> Self {
        Self::new(0, usize::MAX)
    }

    /// Only the first row
    pub fn first() -> Self {
        Self::new(0, 1)
    }

    /// No rows, only the total count
    pub fn count_only() -> Self {
        Self::new(0, 0)
    }

    /// Half-open range `[start, start + size)`
    pub fn range(&self) -> Range<usize> {
        self.start..self.start.saturating_add(self.size)
    }

    pub fn is_count_only(&self) -> bool {
        self.size == 0
    }
}

/// Rows of one page plus the offset and total they were fetched with
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    rows: Vec<T>,
    offset: usize,
    total_size: usize,
}

impl<T> PaginatedResult<T> {
    pub fn new(rows: Vec<T>, offset: usize, total_size: usize) -> Self {
        Self {
            rows,
            offset,
            total_size,
        }
    }

    /// Wrap rows that are the whole result
    pub fn from_rows(rows: Vec<T>) -> Self {
        let total_size = rows.len();
        Self::new(rows, 0, total_size)
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Mutable rows; offset and total stay as they are
    pub fn rows_mut(&mut self) -> &mut Vec<T> {
        &mut self.rows
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Positions of these rows within the full result
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.rows.len()
    }

    /// Whether rows exist beyond this page
    pub fn has_more(&self) -> bool {
        self.offset + self.rows.len() < self.total_size
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn push(&mut self, row: T) {
        self.rows.push(row);
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    /// Rows `[from, to)` of this page, keeping the total and shifting the offset
    pub fn sub_list(&self, from: usize, to: usize) -> HqResult<Self>
    where
        T: Clone,
    {
        if from > to || to > self.rows.len() {
            return Err(HqError::InvalidArgument(format!(
                "sub list [{}, {}) out of bounds for {} rows",
                from,
                to,
                self.rows.len()
            )));
        }
        Ok(Self::new(
            self.rows[from..to].to_vec(),
            self.offset + from,
            self.total_size,
        ))
    }
}

impl<T> Default for PaginatedResult<T> {
    fn default() -> Self {
        Self::from_rows(Vec::new())
    }
}

impl<T> IntoIterator for PaginatedResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PaginatedResult<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl<T> ElementCollection<T> for PaginatedResult<T> {
    type Rebuilt<U> = PaginatedResult<U>;

    fn elements(&self) -> &[T] {
        &self.rows
    }

    /// Derived rows are no longer a page of the original total
    fn rebuild<U>(rows: Vec<U>) -> PaginatedResult<U> {
        PaginatedResult::from_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_presets() {
        assert_eq!(PageWindow::all().range(), 0..usize::MAX);
        assert_eq!(PageWindow::first().range(), 0..1);
        assert!(PageWindow::count_only().is_count_only());
        assert_eq!(PageWindow::new(20, 10).range(), 20..30);
        assert_eq!(PageWindow::new(5, usize::MAX).range(), 5..usize::MAX);
    }

    #[test]
    fn test_map_resets_page_metadata() {
        let page = PaginatedResult::new(vec!["a", "b", "c"], 10, 50);
        let mapped = page.map(|s| s.to_uppercase());

        assert_eq!(mapped.offset(), 0);
        assert_eq!(mapped.total_size(), 3);
        assert_eq!(mapped.rows(), &["A".to_string(), "B".to_string(), "C".to_string()]);

        // The source keeps its own metadata
        assert_eq!(page.offset(), 10);
        assert_eq!(page.total_size(), 50);
    }

    #[test]
    fn test_range_and_has_more() {
        let page = PaginatedResult::new(vec![1, 2, 3], 10, 50);
        assert_eq!(page.range(), 10..13);
        assert!(page.has_more());

        let whole = PaginatedResult::from_rows(vec![1, 2]);
        assert_eq!(whole.range(), 0..2);
        assert!(!whole.has_more());
    }

    #[test]
    fn test_sub_list() {
        let page = PaginatedResult::new(vec![1, 2, 3, 4], 10, 50);
        let sub = page.sub_list(1, 3).unwrap();
        assert_eq!(sub.rows(), &[2, 3]);
        assert_eq!(sub.offset(), 11);
        assert_eq!(sub.total_size(), 50);

        assert!(page.sub_list(3, 2).is_err());
        assert!(page.sub_list(0, 5).is_err());
    }

    #[test]
    fn test_mutation_keeps_metadata() {
        let mut page = PaginatedResult::new(vec![1, 2], 4, 9);
        page.push(3);
        assert_eq!(page.remove(0), Some(1));
        assert_eq!(page.remove(7), None);
        assert_eq!(page.rows(), &[2, 3]);
        assert_eq!(page.offset(), 4);
        assert_eq!(page.total_size(), 9);
    }

    #[test]
    fn test_serialize() {
        let page = PaginatedResult::new(vec![1], 2, 3);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["offset"], 2);
        assert_eq!(json["totalSize"], 3);
        assert_eq!(json["rows"][0], 1);
    }
}

//! Page, sort and filter types consumed by the grid.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::record::InventoryRecord;

/// Sortable grid columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Id,
    Name,
    Category,
    Counter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(field: SortField) -> Self {
        Self { field, direction: Direction::Ascending }
    }

    pub fn desc(field: SortField) -> Self {
        Self { field, direction: Direction::Descending }
    }

    /// Compare two records on this column. Missing values sort last when ascending.
    pub fn compare(&self, a: &InventoryRecord, b: &InventoryRecord) -> Ordering {
        let ordering = match self.field {
            SortField::Id => cmp_missing_last(a.id, b.id),
            SortField::Name => cmp_text(a.name.as_deref(), b.name.as_deref()),
            SortField::Category => cmp_text(a.category.as_deref(), b.category.as_deref()),
            SortField::Counter => cmp_missing_last(a.counter, b.counter),
        };
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

fn cmp_missing_last<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn cmp_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    cmp_missing_last(a.map(str::to_lowercase), b.map(str::to_lowercase))
}

/// Grid filter. Every constraint that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Case-insensitive substring of the name.
    pub name_contains: Option<String>,
    /// Case-insensitive substring of the category.
    pub category_contains: Option<String>,
    pub counter_min: Option<i32>,
    pub counter_max: Option<i32>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        *self == RecordFilter::default()
    }

    pub fn matches(&self, record: &InventoryRecord) -> bool {
        contains(record.name.as_deref(), self.name_contains.as_deref())
            && contains(record.category.as_deref(), self.category_contains.as_deref())
            && self.counter_min.map_or(true, |min| record.counter.is_some_and(|c| c >= min))
            && self.counter_max.map_or(true, |max| record.counter.is_some_and(|c| c <= max))
    }
}

fn contains(value: Option<&str>, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => value.is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase())),
    }
}

/// One page request from the grid (zero-based `page`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
    pub sort: Vec<SortOrder>,
    pub filter: RecordFilter,
}

impl PageRequest {
    pub fn of(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            sort: Vec::new(),
            filter: RecordFilter::default(),
        }
    }

    pub fn sorted_by(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    pub fn filtered(mut self, filter: RecordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.page_size == 0 {
            return Err(StoreError::InvalidPage("page size must be positive".into()));
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }

    /// Sort records by the requested columns, ties broken by id.
    pub fn sort_records(&self, records: &mut [InventoryRecord]) {
        records.sort_by(|a, b| {
            self.sort
                .iter()
                .map(|order| order.compare(a, b))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| a.id.cmp(&b.id))
        });
    }
}

/// A page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

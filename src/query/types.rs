//! Query result structures

/// Result of a list query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// Matching items in display order, after paging
    pub items: Vec<T>,
    /// Number of matches before paging
    pub total_count: usize,
}

impl<T> QueryResult<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }

    pub fn from_items(items: Vec<T>) -> Self {
        let total_count = items.len();
        Self { items, total_count }
    }

    /// Apply offset then limit to an already ordered match list
    pub(crate) fn paged(items: Vec<T>, offset: Option<usize>, limit: Option<usize>) -> Self {
        let total_count = items.len();
        let items = items
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .collect();
        Self { items, total_count }
    }

    /// Number of pages of `page_size` needed for every match
    pub fn pages(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(page_size)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

//! Fixed-size paging over the ordered question list.

use std::fmt;
use std::ops::Range;

use thiserror::Error;

/// Questions shown per page in the take-assessment view.
pub const DEFAULT_PAGE_SIZE: usize = 15;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PaginationError {
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// A 1-indexed page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageNumber(usize);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    /// Returns `None` for 0.
    #[must_use]
    pub fn new(page: usize) -> Option<Self> {
        (page > 0).then_some(Self(page))
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Splits `total` items into pages of `page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: usize,
    page_size: usize,
}

impl Paginator {
    /// # Errors
    ///
    /// Returns `PaginationError::ZeroPageSize` when `page_size == 0`.
    pub fn new(total: usize, page_size: usize) -> Result<Self, PaginationError> {
        if page_size == 0 {
            return Err(PaginationError::ZeroPageSize);
        }
        Ok(Self { total, page_size })
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    #[must_use]
    pub fn contains(&self, page: PageNumber) -> bool {
        page.get() <= self.total_pages()
    }

    /// Index range `[(p-1)*size, min(p*size, total))`; empty for pages past the end.
    #[must_use]
    pub fn range(&self, page: PageNumber) -> Range<usize> {
        let start = (page.get() - 1).saturating_mul(self.page_size).min(self.total);
        let end = start.saturating_add(self.page_size).min(self.total);
        start..end
    }

    /// Borrow the slice of `items` that belongs to `page`.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T], page: PageNumber) -> &'a [T] {
        let range = self.range(page);
        let end = range.end.min(items.len());
        let start = range.start.min(end);
        &items[start..end]
    }

    #[must_use]
    pub fn is_last(&self, page: PageNumber) -> bool {
        page.get() >= self.total_pages()
    }

    #[must_use]
    pub fn next(&self, page: PageNumber) -> Option<PageNumber> {
        if self.is_last(page) {
            None
        } else {
            PageNumber::new(page.get() + 1)
        }
    }

    #[must_use]
    pub fn previous(&self, page: PageNumber) -> Option<PageNumber> {
        PageNumber::new(page.get() - 1)
    }

    pub fn pages(&self) -> impl Iterator<Item = PageNumber> {
        (1..=self.total_pages()).map(PageNumber)
    }
}

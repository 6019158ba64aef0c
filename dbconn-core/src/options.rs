//! Read options for `find` and `find_one`.
//!
//! ```ignore
//! use dbconn::options::{FindOptions, SortDirection};
//!
//! let options = FindOptions::builder()
//!     .sort("age", SortDirection::Desc)
//!     .skip(10)
//!     .limit(5)
//!     .build();
//! ```

use serde::{Deserialize, Serialize};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Which field to sort by and in which direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self { field: field.into(), direction }
    }
}

/// Options for reading many documents.
///
/// Sorting is applied first, then `skip`, then `limit`. Without a sort the
/// order of results is unspecified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }
}

/// Options for reading a single document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindOneOptions {
    pub sort: Option<Sort>,
    pub skip: Option<usize>,
}

impl FindOneOptions {
    pub fn builder() -> FindOneOptionsBuilder {
        FindOneOptionsBuilder::default()
    }
}

impl From<FindOneOptions> for FindOptions {
    fn from(options: FindOneOptions) -> Self {
        FindOptions {
            sort: options.sort,
            skip: options.skip,
            limit: Some(1),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOptionsBuilder {
    options: FindOptions,
}

impl FindOptionsBuilder {
    /// Sorts results by `field`.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.options.sort = Some(Sort::new(field, direction));
        self
    }

    /// Skips the first `skip` matching documents.
    pub fn skip(mut self, skip: usize) -> Self {
        self.options.skip = Some(skip);
        self
    }

    /// Returns at most `limit` documents. Zero means no limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn build(self) -> FindOptions {
        self.options
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOneOptionsBuilder {
    options: FindOneOptions,
}

impl FindOneOptionsBuilder {
    /// Picks the first match according to this ordering.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.options.sort = Some(Sort::new(field, direction));
        self
    }

    /// Skips the first `skip` matching documents.
    pub fn skip(mut self, skip: usize) -> Self {
        self.options.skip = Some(skip);
        self
    }

    pub fn build(self) -> FindOneOptions {
        self.options
    }
}

//! Filter evaluation and result ordering for in-memory documents.
//!
//! [`DocumentMatcher`] decides whether a single document satisfies a
//! [`Filter`]. Matching never fails: a missing field or a value of another type
//! simply does not match. Equality is strict, so `Int32(1)`, `Int64(1)` and
//! `Double(1.0)` are three different values.

use std::{cmp::Ordering, convert::Infallible};

use bson::{Bson, DateTime, Document, oid::ObjectId};

use dbconn_core::{
    filter::{Constraint, Filter, FilterVisitor},
    options::{Sort, SortDirection},
};

/// Evaluates filters against one document.
pub struct DocumentMatcher<'a> {
    document: &'a Document,
}

impl<'a> DocumentMatcher<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` if the document satisfies every clause of `filter`.
    pub fn matches(&mut self, filter: &Filter) -> bool {
        let Ok(matched) = self.visit_filter(filter);
        matched
    }

    /// Keeps the documents that satisfy `filter`.
    pub fn filter_documents<'d, I>(documents: I, filter: &'d Filter) -> impl Iterator<Item = &'d Document>
    where
        I: IntoIterator<Item = &'d Document>,
        I::IntoIter: 'd,
    {
        documents
            .into_iter()
            .filter(move |document| DocumentMatcher::new(document).matches(filter))
    }
}

impl<'a> FilterVisitor for DocumentMatcher<'a> {
    type Output = bool;
    type Error = Infallible;

    fn visit_all(&mut self, clauses: &[(String, Constraint)]) -> Result<Self::Output, Self::Error> {
        for (field, constraint) in clauses {
            if !self.visit_clause(field, constraint)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_eq(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(self.document.get(field) == Some(value))
    }

    fn visit_in(&mut self, field: &str, values: &[Bson]) -> Result<Self::Output, Self::Error> {
        Ok(self
            .document
            .get(field)
            .is_some_and(|field_value| values.contains(field_value)))
    }
}

/// Ordering view of a BSON value used when sorting results.
///
/// Types are ranked the way document databases usually rank them: missing and
/// null first, then numbers, strings, documents and arrays, object ids,
/// booleans and datetimes. Numbers compare by value across integer and float
/// types, with NaN below every other number. Values of types that have no
/// natural order (documents, arrays, binary data) compare equal.
#[derive(Debug)]
pub(crate) enum SortKey<'a> {
    Null,
    Number(f64),
    String(&'a str),
    Other,
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
}

impl<'a> SortKey<'a> {
    fn rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Number(_) => 1,
            SortKey::String(_) => 2,
            SortKey::Other => 3,
            SortKey::ObjectId(_) => 4,
            SortKey::Bool(_) => 5,
            SortKey::DateTime(_) => 6,
        }
    }

    fn of(document: &'a Document, field: &str) -> Self {
        document
            .get(field)
            .map(SortKey::from)
            .unwrap_or(SortKey::Null)
    }
}

impl<'a> From<&'a Bson> for SortKey<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => SortKey::Null,
            Bson::Int32(value) => SortKey::Number(*value as f64),
            Bson::Int64(value) => SortKey::Number(*value as f64),
            Bson::Double(value) => SortKey::Number(*value),
            Bson::String(value) | Bson::Symbol(value) => SortKey::String(value),
            Bson::ObjectId(value) => SortKey::ObjectId(*value),
            Bson::Boolean(value) => SortKey::Bool(*value),
            Bson::DateTime(value) => SortKey::DateTime(*value),
            _ => SortKey::Other,
        }
    }
}

impl<'a> SortKey<'a> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => compare_numbers(*a, *b),
            (SortKey::String(a), SortKey::String(b)) => a.cmp(b),
            (SortKey::ObjectId(a), SortKey::ObjectId(b)) => a.bytes().cmp(&b.bytes()),
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            (SortKey::DateTime(a), SortKey::DateTime(b)) => {
                a.timestamp_millis().cmp(&b.timestamp_millis())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Stable-sorts documents by the sort field.
pub(crate) fn sort_documents(documents: &mut [&Document], sort: &Sort) {
    documents.sort_by(|a, b| {
        let ordering = SortKey::of(a, &sort.field).compare(&SortKey::of(b, &sort.field));

        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

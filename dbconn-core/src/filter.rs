//! Filter specifications for selecting documents.
//!
//! A [`Filter`] is a conjunction of per-field clauses. Each clause carries a
//! [`Constraint`], either exact equality or membership in a list of values.
//! Nothing else is supported: nested field paths, range operators and logical
//! combinators are rejected with [`DbError::UnsupportedFilter`] when the filter
//! is built, so a filter that exists is always one every connector can evaluate.
//!
//! # Building filters
//!
//! ```ignore
//! use dbconn::filter::Filter;
//!
//! let filter = Filter::builder()
//!     .eq("name", "Alice")
//!     .any_of("role", ["admin", "ops"])
//!     .build()?;
//! ```
//!
//! Filters can also be parsed from a BSON document in the familiar query shape:
//!
//! ```ignore
//! use bson::doc;
//! use dbconn::filter::Filter;
//!
//! let filter = Filter::try_from(doc! {
//!     "name": "Alice",
//!     "role": { "$in": ["admin", "ops"] },
//! })?;
//! ```

use bson::{Bson, Document};

use crate::{
    document::ID_FIELD,
    error::{DbError, DbResult},
};

/// The only operator accepted inside a constraint document.
pub const IN_OPERATOR: &str = "$in";

/// The condition a single field must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// The field equals the value: same BSON type and same value.
    Eq(Bson),
    /// The field equals any of the values. An empty list never matches.
    In(Vec<Bson>),
}

impl Constraint {
    fn parse(field: &str, value: Bson) -> DbResult<Self> {
        match value {
            Bson::Document(query) if query.is_empty() => Err(DbError::UnsupportedFilter(format!(
                "empty constraint on field '{field}'"
            ))),
            Bson::Document(query) if has_operator_keys(&query) => Self::parse_operator(field, query),
            value => Ok(Constraint::Eq(value)),
        }
    }

    fn parse_operator(field: &str, query: Document) -> DbResult<Self> {
        let count = query.len();
        let mut entries = query.into_iter();
        let (operator, operand) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(DbError::UnsupportedFilter(format!(
                    "constraint on field '{field}' must hold exactly one operator, found {count}"
                )));
            }
        };

        if operator != IN_OPERATOR {
            return Err(DbError::UnsupportedFilter(format!(
                "operator '{operator}' on field '{field}'"
            )));
        }

        match operand {
            Bson::Array(values) => Ok(Constraint::In(values)),
            other => Err(DbError::UnsupportedFilter(format!(
                "'{IN_OPERATOR}' on field '{field}' expects an array, got {:?}",
                other.element_type()
            ))),
        }
    }

    fn validate(&self, field: &str) -> DbResult<()> {
        match self {
            Constraint::Eq(Bson::Document(value)) if has_operator_keys(value) => {
                Err(DbError::UnsupportedFilter(format!(
                    "equality value for field '{field}' contains operator keys"
                )))
            }
            _ => Ok(()),
        }
    }
}

fn has_operator_keys(document: &Document) -> bool {
    document.keys().any(|key| key.starts_with('$'))
}

fn validate_field(field: &str) -> DbResult<()> {
    if field.is_empty() {
        return Err(DbError::UnsupportedFilter("empty field name".to_string()));
    }
    if field.starts_with('$') {
        return Err(DbError::UnsupportedFilter(format!(
            "top-level operator '{field}'"
        )));
    }
    if field.contains('.') {
        return Err(DbError::UnsupportedFilter(format!(
            "nested field path '{field}'"
        )));
    }

    Ok(())
}

/// A conjunctive predicate over document fields.
///
/// A document matches when every clause is satisfied. The empty filter matches
/// every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Constraint)>,
}

impl Filter {
    /// A filter that matches every document.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a new builder.
    pub fn builder() -> FilterBuilder {
        FilterBuilder::default()
    }

    /// A filter selecting the document with the given identifier.
    pub fn by_id(id: impl Into<Bson>) -> Self {
        Self {
            clauses: vec![(ID_FIELD.to_string(), Constraint::Eq(id.into()))],
        }
    }

    /// The clauses of this filter, in the order they were added.
    pub fn clauses(&self) -> &[(String, Constraint)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl TryFrom<Document> for Filter {
    type Error = DbError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        let clauses = document
            .into_iter()
            .map(|(field, value)| {
                validate_field(&field)?;
                let constraint = Constraint::parse(&field, value)?;
                Ok((field, constraint))
            })
            .collect::<DbResult<Vec<_>>>()?;

        Ok(Self { clauses })
    }
}

/// Fluent builder for [`Filter`].
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    clauses: Vec<(String, Constraint)>,
}

impl FilterBuilder {
    /// Requires `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.clauses
            .push((field.into(), Constraint::Eq(value.into())));
        self
    }

    /// Requires `field` to equal one of `values`.
    pub fn any_of<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        self.clauses.push((
            field.into(),
            Constraint::In(values.into_iter().map(Into::into).collect()),
        ));
        self
    }

    /// Validates the clauses and builds the filter.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::UnsupportedFilter`] for empty, `$`-prefixed or dotted
    /// field names, and for equality values that look like operator documents.
    pub fn build(self) -> DbResult<Filter> {
        for (field, constraint) in &self.clauses {
            validate_field(field)?;
            constraint.validate(field)?;
        }

        Ok(Filter { clauses: self.clauses })
    }
}

/// Walks a [`Filter`] to evaluate or translate it.
///
/// Implemented by the in-memory matcher and by driver translators.
pub trait FilterVisitor {
    type Output;
    type Error: Into<DbError>;

    /// Combines all clauses of a filter; called once per filter.
    fn visit_all(&mut self, clauses: &[(String, Constraint)]) -> Result<Self::Output, Self::Error>;
    fn visit_eq(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error>;
    fn visit_in(&mut self, field: &str, values: &[Bson]) -> Result<Self::Output, Self::Error>;

    fn visit_clause(
        &mut self,
        field: &str,
        constraint: &Constraint,
    ) -> Result<Self::Output, Self::Error> {
        match constraint {
            Constraint::Eq(value) => self.visit_eq(field, value),
            Constraint::In(values) => self.visit_in(field, values),
        }
    }

    fn visit_filter(&mut self, filter: &Filter) -> Result<Self::Output, Self::Error> {
        self.visit_all(filter.clauses())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use rstest::rstest;

    #[test]
    fn parses_equality_and_membership_in_order() {
        let filter = Filter::try_from(doc! {
            "name": "x",
            "role": { "$in": ["a", "b"] },
            "address": { "city": "Oslo" },
        })
        .unwrap();

        assert_eq!(
            filter.clauses(),
            &[
                ("name".to_string(), Constraint::Eq(Bson::from("x"))),
                (
                    "role".to_string(),
                    Constraint::In(vec![Bson::from("a"), Bson::from("b")])
                ),
                (
                    "address".to_string(),
                    Constraint::Eq(Bson::Document(doc! { "city": "Oslo" }))
                ),
            ]
        );
    }

    #[test]
    fn empty_document_parses_to_empty_filter() {
        let filter = Filter::try_from(doc! {}).unwrap();

        assert!(filter.is_empty());
        assert_eq!(filter, Filter::empty());
    }

    #[test]
    fn builder_matches_parsed_form() {
        let built = Filter::builder()
            .eq("name", "x")
            .any_of("age", [1_i32, 2_i32])
            .build()
            .unwrap();
        let parsed = Filter::try_from(doc! {
            "name": "x",
            "age": { "$in": [1_i32, 2_i32] },
        })
        .unwrap();

        assert_eq!(built, parsed);
    }

    #[test]
    fn by_id_targets_identifier_field() {
        assert_eq!(
            Filter::by_id("a").clauses(),
            &[(ID_FIELD.to_string(), Constraint::Eq(Bson::from("a")))]
        );
    }

    #[rstest]
    #[case(doc! { "age": { "$gt": 3 } }, "operator '$gt'")]
    #[case(doc! { "age": { "$in": 3 } }, "expects an array")]
    #[case(doc! { "age": { "$in": [1], "$nin": [2] } }, "exactly one operator")]
    #[case(doc! { "age": {} }, "empty constraint")]
    #[case(doc! { "$or": [{ "a": 1 }, { "b": 2 }] }, "top-level operator")]
    #[case(doc! { "address.city": "Oslo" }, "nested field path")]
    #[case(doc! { "": 1 }, "empty field name")]
    fn rejects_unsupported_shapes(#[case] query: Document, #[case] expected: &str) {
        let err = Filter::try_from(query).unwrap_err();

        match err {
            DbError::UnsupportedFilter(msg) => assert!(
                msg.contains(expected),
                "expected message containing '{expected}', got: {msg}"
            ),
            other => panic!("expected UnsupportedFilter, got {other:?}"),
        }
    }

    #[test]
    fn builder_rejects_dotted_path() {
        let err = Filter::builder()
            .eq("a.b", 1)
            .build()
            .unwrap_err();

        assert!(matches!(err, DbError::UnsupportedFilter(_)));
    }

    #[test]
    fn builder_rejects_operator_document_as_equality_value() {
        let err = Filter::builder()
            .eq("age", doc! { "$gt": 3 })
            .build()
            .unwrap_err();

        assert!(matches!(err, DbError::UnsupportedFilter(_)));
    }

    struct ClauseCounter;

    impl FilterVisitor for ClauseCounter {
        type Output = usize;
        type Error = DbError;

        fn visit_all(&mut self, clauses: &[(String, Constraint)]) -> DbResult<usize> {
            clauses
                .iter()
                .map(|(field, constraint)| self.visit_clause(field, constraint))
                .sum()
        }

        fn visit_eq(&mut self, _field: &str, _value: &Bson) -> DbResult<usize> {
            Ok(1)
        }

        fn visit_in(&mut self, _field: &str, values: &[Bson]) -> DbResult<usize> {
            Ok(values.len())
        }
    }

    #[test]
    fn visitor_dispatches_each_clause() {
        let filter = Filter::builder()
            .eq("name", "x")
            .any_of("role", ["a", "b", "c"])
            .build()
            .unwrap();

        assert_eq!(ClauseCounter.visit_filter(&filter).unwrap(), 4);
    }
}

//! Filter translation into MongoDB query documents.

use bson::{Bson, Document, doc};

use dbconn_core::{
    error::DbError,
    filter::{Constraint, FilterVisitor},
    options::{Sort, SortDirection},
};

/// Translates a [`Filter`](dbconn_core::filter::Filter) into the query document
/// the driver expects.
///
/// Equality is spelled with an explicit `$eq` so that a document value is
/// compared as a whole instead of being read as an operator map.
pub(crate) struct MongoFilterTranslator;

impl FilterVisitor for MongoFilterTranslator {
    type Output = Document;
    type Error = DbError;

    fn visit_all(&mut self, clauses: &[(String, Constraint)]) -> Result<Self::Output, Self::Error> {
        let mut translated = clauses
            .iter()
            .map(|(field, constraint)| self.visit_clause(field, constraint))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match translated.len() {
            0 => doc! {},
            1 => translated.remove(0),
            _ => doc! { "$and": translated },
        })
    }

    fn visit_eq(&mut self, field: &str, value: &Bson) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$eq": value.clone() },
        })
    }

    fn visit_in(&mut self, field: &str, values: &[Bson]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            field: { "$in": values.to_vec() },
        })
    }
}

pub(crate) fn sort_document(sort: &Sort) -> Document {
    doc! {
        sort.field.clone(): match sort.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

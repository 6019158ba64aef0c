//! Conversion between caller values and the canonical [`Document`] representation.
//!
//! Callers hand the connectors arbitrary `Serialize` values. Before anything is
//! stored those values are normalized through a structural round trip into a
//! BSON document, which is lossless for every BSON value type. Reads go the other
//! way with [`from_document`].

use bson::{Bson, Document, de::deserialize_from_bson, oid::ObjectId, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{DbError, DbResult};

/// Name of the field holding a document's identifier.
pub const ID_FIELD: &str = "_id";

/// Normalizes any serializable value into a [`Document`].
///
/// # Errors
///
/// Returns [`DbError::Conversion`] if serialization fails or if the value does
/// not serialize to a document (a bare string, number or array, for instance).
///
/// # Example
///
/// ```ignore
/// use dbconn::document::to_document;
///
/// #[derive(serde::Serialize)]
/// struct User { name: String }
///
/// let doc = to_document(&User { name: "Alice".into() })?;
/// assert_eq!(doc.get_str("name")?, "Alice");
/// ```
pub fn to_document<T>(value: &T) -> DbResult<Document>
where
    T: Serialize + ?Sized,
{
    match serialize_to_bson(value)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(DbError::Conversion(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Decodes a stored [`Document`] into a caller type.
///
/// # Errors
///
/// Returns [`DbError::Conversion`] if the document does not fit `T`.
pub fn from_document<T: DeserializeOwned>(document: Document) -> DbResult<T> {
    Ok(deserialize_from_bson(Bson::Document(document))?)
}

/// Returns the document's identifier, generating an [`ObjectId`] first if the
/// document has none.
///
/// A generated identifier is inserted at the front of the document, where the
/// driver would put it.
pub fn ensure_id(document: &mut Document) -> Bson {
    ensure_id_with(document, || Bson::ObjectId(ObjectId::new()))
}

/// Like [`ensure_id`], taking the identifier from `fallback` when the document
/// has none.
pub fn ensure_id_with<F>(document: &mut Document, fallback: F) -> Bson
where
    F: FnOnce() -> Bson,
{
    if let Some(id) = document.get(ID_FIELD) {
        return id.clone();
    }

    let id = fallback();
    let mut with_id = Document::new();
    with_id.insert(ID_FIELD, id.clone());
    for (key, value) in std::mem::take(document) {
        with_id.insert(key, value);
    }
    *document = with_id;

    id
}

/// Normalizes a value and makes sure the result carries an identifier.
pub fn normalize<T>(value: &T) -> DbResult<(Bson, Document)>
where
    T: Serialize + ?Sized,
{
    let mut document = to_document(value)?;
    let id = ensure_id(&mut document);

    Ok((id, document))
}

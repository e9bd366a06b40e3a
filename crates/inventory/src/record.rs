use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::{Document, DocumentId, DomainError, DomainResult, FieldValue};

use crate::form::ItemFields;

/// Stored field names.
pub mod fields {
    pub const NAME: &str = "name";
    pub const QUANTITY: &str = "quantity";
    pub const PRICE: &str = "price";
    pub const CATEGORY: &str = "category";
    pub const CREATED_AT: &str = "createdAt";
}

/// One stock-keeping unit.
///
/// `id` is `None` until the record has been persisted; the store assigns it on
/// creation. `created_at` is set once and carried unchanged through edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Option<DocumentId>,
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// A stored document that does not have the shape of an inventory record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("document {id}: missing field '{field}'")]
    MissingField { id: DocumentId, field: &'static str },

    #[error("document {id}: field '{field}' expected {expected}, found {found}")]
    WrongType {
        id: DocumentId,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("document {id}: field '{field}' out of range: {detail}")]
    OutOfRange {
        id: DocumentId,
        field: &'static str,
        detail: String,
    },
}

impl MalformedRecord {
    /// Identifier of the offending document.
    pub fn id(&self) -> &DocumentId {
        match self {
            MalformedRecord::MissingField { id, .. }
            | MalformedRecord::WrongType { id, .. }
            | MalformedRecord::OutOfRange { id, .. } => id,
        }
    }
}

impl InventoryRecord {
    /// Build an unsaved record from validated fields.
    pub fn draft(fields: ItemFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name: fields.name,
            quantity: fields.quantity,
            price: fields.price,
            category: fields.category,
            created_at,
        }
    }

    /// Apply edited fields, keeping identity and creation time.
    pub fn with_fields(&self, fields: ItemFields) -> Self {
        Self {
            id: self.id.clone(),
            name: fields.name,
            quantity: fields.quantity,
            price: fields.price,
            category: fields.category,
            created_at: self.created_at,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    /// `quantity * price` for this record.
    pub fn stock_value(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }

    /// Check the invariants a record must hold before it reaches the store.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if !self.price.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        if self.price < 0.0 {
            return Err(DomainError::validation("price cannot be negative"));
        }
        Ok(())
    }

    /// Serialize into the stored field map. The identifier is omitted; the store
    /// keeps it separately.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(fields::NAME.to_string(), FieldValue::from(self.name.as_str()));
        doc.insert(
            fields::QUANTITY.to_string(),
            FieldValue::Integer(i64::from(self.quantity)),
        );
        doc.insert(fields::PRICE.to_string(), FieldValue::Double(self.price));
        doc.insert(
            fields::CATEGORY.to_string(),
            FieldValue::from(self.category.as_str()),
        );
        doc.insert(
            fields::CREATED_AT.to_string(),
            FieldValue::Timestamp(self.created_at),
        );
        doc
    }

    /// Rebuild a record from a stored field map and its externally supplied id.
    pub fn from_document(id: DocumentId, doc: &Document) -> Result<Self, MalformedRecord> {
        let name = read_string(&id, doc, fields::NAME)?;
        let category = read_string(&id, doc, fields::CATEGORY)?;

        let raw_quantity = read(&id, doc, fields::QUANTITY)?;
        let quantity = raw_quantity.as_integer().ok_or_else(|| MalformedRecord::WrongType {
            id: id.clone(),
            field: fields::QUANTITY,
            expected: "integer",
            found: raw_quantity.type_name(),
        })?;
        let quantity = u32::try_from(quantity).map_err(|_| MalformedRecord::OutOfRange {
            id: id.clone(),
            field: fields::QUANTITY,
            detail: format!("{quantity} is not a valid stock count"),
        })?;

        // Whole-number prices may come back narrowed to integers.
        let raw_price = read(&id, doc, fields::PRICE)?;
        let price = raw_price.as_number().ok_or_else(|| MalformedRecord::WrongType {
            id: id.clone(),
            field: fields::PRICE,
            expected: "double",
            found: raw_price.type_name(),
        })?;
        if !price.is_finite() || price < 0.0 {
            return Err(MalformedRecord::OutOfRange {
                id,
                field: fields::PRICE,
                detail: format!("{price} is not a valid unit price"),
            });
        }

        let raw_created = read(&id, doc, fields::CREATED_AT)?;
        let created_at = raw_created.as_timestamp().ok_or_else(|| MalformedRecord::WrongType {
            id: id.clone(),
            field: fields::CREATED_AT,
            expected: "timestamp",
            found: raw_created.type_name(),
        })?;

        Ok(Self {
            id: Some(id),
            name,
            quantity,
            price,
            category,
            created_at,
        })
    }
}

fn read<'a>(
    id: &DocumentId,
    doc: &'a Document,
    field: &'static str,
) -> Result<&'a FieldValue, MalformedRecord> {
    match doc.get(field) {
        Some(FieldValue::Null) | None => Err(MalformedRecord::MissingField {
            id: id.clone(),
            field,
        }),
        Some(value) => Ok(value),
    }
}

fn read_string(
    id: &DocumentId,
    doc: &Document,
    field: &'static str,
) -> Result<String, MalformedRecord> {
    let value = read(id, doc, field)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| MalformedRecord::WrongType {
            id: id.clone(),
            field,
            expected: "string",
            found: value.type_name(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()
    }

    fn test_id() -> DocumentId {
        "doc-1".parse().unwrap()
    }

    fn pen() -> InventoryRecord {
        InventoryRecord {
            id: Some(test_id()),
            name: "Pen".to_string(),
            quantity: 5,
            price: 1.5,
            category: "Office".to_string(),
            created_at: test_time(),
        }
    }

    #[test]
    fn serialize_omits_id_and_uses_native_timestamp() {
        let doc = pen().to_document();
        assert_eq!(doc.len(), 5);
        assert!(!doc.contains_key("id"));
        assert_eq!(
            doc.get(fields::CREATED_AT),
            Some(&FieldValue::Timestamp(test_time()))
        );
        assert_eq!(doc.get(fields::QUANTITY), Some(&FieldValue::Integer(5)));
    }

    #[test]
    fn deserialize_restores_record() {
        let record = pen();
        let back = InventoryRecord::from_document(test_id(), &record.to_document()).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn deserialize_accepts_integer_price() {
        let mut doc = pen().to_document();
        doc.insert(fields::PRICE.to_string(), FieldValue::Integer(40));
        let rec = InventoryRecord::from_document(test_id(), &doc).unwrap();
        assert_eq!(rec.price, 40.0);
    }

    #[test]
    fn deserialize_rejects_missing_field() {
        let mut doc = pen().to_document();
        doc.remove(fields::CATEGORY);
        let err = InventoryRecord::from_document(test_id(), &doc).unwrap_err();
        assert_eq!(
            err,
            MalformedRecord::MissingField {
                id: test_id(),
                field: fields::CATEGORY
            }
        );
    }

    #[test]
    fn deserialize_treats_null_as_missing() {
        let mut doc = pen().to_document();
        doc.insert(fields::NAME.to_string(), FieldValue::Null);
        let err = InventoryRecord::from_document(test_id(), &doc).unwrap_err();
        assert!(matches!(err, MalformedRecord::MissingField { field: "name", .. }));
    }

    #[test]
    fn deserialize_rejects_non_numeric_quantity() {
        let mut doc = pen().to_document();
        doc.insert(fields::QUANTITY.to_string(), FieldValue::from("five"));
        let err = InventoryRecord::from_document(test_id(), &doc).unwrap_err();
        match err {
            MalformedRecord::WrongType { field, expected, found, .. } => {
                assert_eq!(field, fields::QUANTITY);
                assert_eq!(expected, "integer");
                assert_eq!(found, "string");
            }
            other => panic!("expected WrongType, got {other:?}"),
        }
    }

    #[test]
    fn deserialize_rejects_negative_values() {
        let mut doc = pen().to_document();
        doc.insert(fields::QUANTITY.to_string(), FieldValue::Integer(-1));
        assert!(matches!(
            InventoryRecord::from_document(test_id(), &doc),
            Err(MalformedRecord::OutOfRange { field: "quantity", .. })
        ));

        let mut doc = pen().to_document();
        doc.insert(fields::PRICE.to_string(), FieldValue::Double(-0.5));
        assert!(matches!(
            InventoryRecord::from_document(test_id(), &doc),
            Err(MalformedRecord::OutOfRange { field: "price", .. })
        ));
    }

    #[test]
    fn deserialize_rejects_string_timestamp() {
        let mut doc = pen().to_document();
        doc.insert(
            fields::CREATED_AT.to_string(),
            FieldValue::from("2024-05-17T09:30:00Z"),
        );
        let err = InventoryRecord::from_document(test_id(), &doc).unwrap_err();
        assert_eq!(err.id(), &test_id());
        assert!(matches!(err, MalformedRecord::WrongType { field: "createdAt", .. }));
    }

    #[test]
    fn with_fields_keeps_identity_and_creation_time() {
        let record = pen();
        let edited = record.with_fields(ItemFields {
            name: "Gel Pen".to_string(),
            quantity: 12,
            price: 2.0,
            category: "Office".to_string(),
        });
        assert_eq!(edited.id, record.id);
        assert_eq!(edited.created_at, record.created_at);
        assert_eq!(edited.name, "Gel Pen");
        assert_eq!(edited.quantity, 12);
    }

    #[test]
    fn validate_rejects_blank_and_negative() {
        let mut rec = pen();
        rec.name = "   ".to_string();
        assert!(rec.validate().unwrap_err().is_validation());

        let mut rec = pen();
        rec.category = String::new();
        assert!(rec.validate().is_err());

        let mut rec = pen();
        rec.price = -1.0;
        assert!(rec.validate().is_err());

        let mut rec = pen();
        rec.price = f64::NAN;
        assert!(rec.validate().is_err());

        assert!(pen().validate().is_ok());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: a valid record survives serialize + deserialize.
            #[test]
            fn document_round_trip(
                name in "[A-Za-z][A-Za-z0-9 ]{0,40}",
                category in "[A-Za-z][A-Za-z ]{0,20}",
                quantity in any::<u32>(),
                price in 0.0f64..1_000_000.0,
                secs in 0i64..4_000_000_000,
                nanos in 0u32..1_000_000_000,
            ) {
                let id: DocumentId = "prop-doc".parse().unwrap();
                let record = InventoryRecord {
                    id: Some(id.clone()),
                    name,
                    quantity,
                    price,
                    category,
                    created_at: Utc.timestamp_opt(secs, nanos).unwrap(),
                };
                let back = InventoryRecord::from_document(id, &record.to_document()).unwrap();
                prop_assert_eq!(back, record);
            }
        }
    }
}

//! Raw item input, as typed by a user, and its validation.

use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

/// Unvalidated text input for an item (add/edit form).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemForm {
    pub name: String,
    pub quantity: String,
    pub price: String,
    pub category: String,
}

/// Validated item fields, ready to become a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemFields {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
    pub category: String,
}

impl ItemForm {
    pub fn new(
        name: impl Into<String>,
        quantity: impl Into<String>,
        price: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            quantity: quantity.into(),
            price: price.into(),
            category: category.into(),
        }
    }

    /// Validate the input. Surrounding whitespace is trimmed from every field.
    pub fn parse(&self) -> DomainResult<ItemFields> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        let category = self.category.trim();
        if category.is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }

        let quantity = self.quantity.trim();
        if quantity.starts_with('-') {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        let quantity: u32 = quantity.parse().map_err(|_| {
            DomainError::validation(format!("quantity '{quantity}' is not a whole number"))
        })?;

        let price = self.price.trim();
        let price: f64 = price
            .parse()
            .map_err(|_| DomainError::validation(format!("price '{price}' is not a number")))?;
        if !price.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        if price < 0.0 {
            return Err(DomainError::validation("price cannot be negative"));
        }

        Ok(ItemFields {
            name: name.to_string(),
            quantity,
            price,
            category: category.to_string(),
        })
    }
}

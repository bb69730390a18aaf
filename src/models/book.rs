//! Book (catalog) model and related types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Catalog entry with its copy counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// Total copies owned
    pub quantity: i32,
    /// Copies not currently on loan
    pub available: i32,
}

impl Book {
    /// Copies currently on loan
    pub fn on_loan(&self) -> i32 {
        self.quantity - self.available
    }

    pub fn is_consistent(&self) -> bool {
        0 <= self.available && self.available <= self.quantity
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_create_counters"))]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
    /// Defaults to 1
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    /// Defaults to `quantity`
    #[validate(range(min = 0, message = "Available cannot be negative"))]
    pub available: Option<i32>,
}

impl CreateBook {
    pub fn quantity(&self) -> i32 {
        self.quantity.unwrap_or(1)
    }

    pub fn available(&self) -> i32 {
        self.available.unwrap_or_else(|| self.quantity())
    }
}

fn validate_create_counters(book: &CreateBook) -> Result<(), ValidationError> {
    if book.available() > book.quantity() {
        let mut err = ValidationError::new("available_exceeds_quantity");
        err.message = Some("Available cannot exceed quantity".into());
        return Err(err);
    }
    Ok(())
}

/// Update book request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: Option<String>,
    #[validate(length(min = 1, message = "ISBN cannot be empty"))]
    pub isbn: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    #[validate(range(min = 0, message = "Available cannot be negative"))]
    pub available: Option<i32>,
}

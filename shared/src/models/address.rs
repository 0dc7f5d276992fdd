//! Address value object
//!
//! Addresses are snapshotted onto the order at creation time and never
//! reference a mutable address book entry.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Postal address snapshot (value object)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct Address {
    /// Recipient name
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    /// Address line 1
    #[validate(length(min = 1, max = 200))]
    pub line1: String,
    /// Address line 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    /// Contact phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

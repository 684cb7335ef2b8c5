//! Shipping addresses.

use chrono::{DateTime, Utc};
use serde::Serialize;

use threadline_core::{AddressId, UserId};

/// A saved shipping address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country_code: String,
    pub phone: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// Single-line form used on order confirmations and snapshots.
    #[must_use]
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.full_name.as_str(), self.line1.as_str()];
        if let Some(line2) = self.line2.as_deref() {
            parts.push(line2);
        }
        parts.extend([
            self.city.as_str(),
            self.region.as_str(),
            self.postal_code.as_str(),
            self.country_code.as_str(),
        ]);
        parts.join(", ")
    }
}

/// A validated address ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub full_name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country_code: String,
    pub phone: Option<String>,
}

impl NewAddress {
    /// Maximum length of any free-text field.
    pub const MAX_FIELD_LENGTH: usize = 200;

    /// Trim and validate the submitted fields.
    ///
    /// # Errors
    ///
    /// Returns a message suitable for display naming the first invalid field.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        full_name: &str,
        line1: &str,
        line2: Option<&str>,
        city: &str,
        region: &str,
        postal_code: &str,
        country_code: &str,
        phone: Option<&str>,
    ) -> Result<Self, String> {
        let country_code = country_code.trim().to_ascii_uppercase();
        if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err("Country must be a two-letter code".to_owned());
        }

        Ok(Self {
            full_name: required("Full name", full_name)?,
            line1: required("Address line 1", line1)?,
            line2: optional("Address line 2", line2)?,
            city: required("City", city)?,
            region: required("State / region", region)?,
            postal_code: required("Postal code", postal_code)?,
            country_code,
            phone: optional("Phone", phone)?,
        })
    }
}

fn required(label: &str, value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{label} is required"));
    }
    if value.len() > NewAddress::MAX_FIELD_LENGTH {
        return Err(format!("{label} is too long"));
    }
    Ok(value.to_owned())
}

fn optional(label: &str, value: Option<&str>) -> Result<Option<String>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required(label, v).map(Some),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_address_trims_and_uppercases_country() {
        let addr = NewAddress::new(
            " Ada Lovelace ",
            "12 Loom St",
            Some("   "),
            "London",
            "Greater London",
            "N1 9GU",
            "gb",
            None,
        )
        .unwrap();
        assert_eq!(addr.full_name, "Ada Lovelace");
        assert_eq!(addr.line2, None);
        assert_eq!(addr.country_code, "GB");
    }

    #[test]
    fn test_new_address_requires_fields() {
        let err = NewAddress::new("", "1 Main", None, "X", "Y", "1", "US", None).unwrap_err();
        assert_eq!(err, "Full name is required");
        let err =
            NewAddress::new("A", "1 Main", None, "X", "Y", "1", "USA", None).unwrap_err();
        assert_eq!(err, "Country must be a two-letter code");
    }
}

//! Catalog and order enums.
//!
//! Both map to `PostgreSQL` enum types in the `storefront` schema when the
//! `postgres` feature is enabled.

use serde::{Deserialize, Serialize};

/// Target audience of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.gender", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Men,
    Women,
    Unisex,
    Kids,
}

impl Gender {
    /// All genders in navigation order.
    pub const ALL: [Self; 4] = [Self::Women, Self::Men, Self::Unisex, Self::Kids];

    /// Query-string / database value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
            Self::Unisex => "unisex",
            Self::Kids => "kids",
        }
    }

    /// Human label for navigation.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Men => "Men",
            Self::Women => "Women",
            Self::Unisex => "Unisex",
            Self::Kids => "Kids",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "men" => Ok(Self::Men),
            "women" => Ok(Self::Women),
            "unisex" => Ok(Self::Unisex),
            "kids" => Ok(Self::Kids),
            _ => Err(format!("invalid gender: {s}")),
        }
    }
}

/// Lifecycle of a placed order.
///
/// Checkout only ever creates `Placed`; the later states are set by
/// fulfillment tooling outside the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "storefront.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Placed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Human label for order history.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Placed => "Placed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_roundtrip_through_str() {
        for gender in Gender::ALL {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), gender);
        }
    }

    #[test]
    fn test_gender_parse_is_case_insensitive() {
        assert_eq!(" Women ".parse::<Gender>().unwrap(), Gender::Women);
        assert!("adults".parse::<Gender>().is_err());
    }

    #[test]
    fn test_gender_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Gender::Kids).unwrap(), "\"kids\"");
    }

    #[test]
    fn test_order_status_default_is_placed() {
        assert_eq!(OrderStatus::default(), OrderStatus::Placed);
        assert_eq!(OrderStatus::Shipped.to_string(), "Shipped");
    }
}

//! Cart line quantity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative.
    #[error("quantity must be at least {min}")]
    TooSmall {
        /// Smallest accepted quantity.
        min: u32,
    },
    /// Above the per-line cap.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Largest accepted quantity.
        max: u32,
    },
}

/// A positive quantity of one SKU on a cart line or order item.
///
/// Cart lines never hold zero: a line at quantity 1 is removed explicitly,
/// not decremented.
///
/// ```
/// use threadline_core::Quantity;
///
/// assert_eq!(Quantity::new(2).unwrap().get(), 2);
/// assert!(Quantity::new(0).is_err());
/// assert!(Quantity::new(Quantity::MAX + 1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Smallest quantity a line can hold.
    pub const MIN: u32 = 1;
    /// Largest quantity a single add or line can hold.
    pub const MAX: u32 = 99;
    /// Quantity of one.
    pub const ONE: Self = Self(1);
    /// The per-line cap as a quantity.
    pub const LARGEST: Self = Self(Self::MAX);

    /// Create a quantity, validating the bounds.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError`] when `value` is outside `MIN..=MAX`.
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value < Self::MIN {
            return Err(QuantityError::TooSmall { min: Self::MIN });
        }
        if value > Self::MAX {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        Ok(Self(value))
    }

    /// Build from a database `INTEGER`.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooSmall`] for zero or negative values and
    /// [`QuantityError::TooLarge`] above the cap.
    pub fn from_i32(value: i32) -> Result<Self, QuantityError> {
        let value = u32::try_from(value).map_err(|_| QuantityError::TooSmall { min: Self::MIN })?;
        Self::new(value)
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The value as a database `INTEGER`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // bounded by MAX
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(
            Quantity::new(0),
            Err(QuantityError::TooSmall { min: 1 })
        );
        assert_eq!(
            Quantity::new(100),
            Err(QuantityError::TooLarge { max: 99 })
        );
        assert_eq!(Quantity::new(99).unwrap().get(), 99);
    }

    #[test]
    fn test_from_i32_rejects_negative() {
        assert!(Quantity::from_i32(-3).is_err());
        assert_eq!(Quantity::from_i32(4).unwrap().as_i32(), 4);
    }

    #[test]
    fn test_default_is_one() {
        assert_eq!(Quantity::default(), Quantity::ONE);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Quantity = serde_json::from_str("3").unwrap();
        assert_eq!(ok.get(), 3);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }
}

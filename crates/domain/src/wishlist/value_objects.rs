//! Value objects for the wishlist domain.

use serde::{Deserialize, Serialize};

/// Unit an item quantity is counted in ("pcs", "kg", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementUnit(String);

impl MeasurementUnit {
    /// Creates a measurement unit from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the unit name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MeasurementUnit {
    fn default() -> Self {
        Self::new("pcs")
    }
}

impl std::fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MeasurementUnit {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MeasurementUnit {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Relative importance of an item. Higher is more important.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl From<u8> for Priority {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_unit_defaults_to_pieces() {
        assert_eq!(MeasurementUnit::default().as_str(), "pcs");
    }

    #[test]
    fn priorities_order_by_value() {
        assert!(Priority::new(3) > Priority::new(1));
        assert_eq!(Priority::default().value(), 0);
    }
}

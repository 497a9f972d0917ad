//! Purchased quantities and their unit of measure.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Quantity represented as **thousandths** of the unit.
///
/// `1.5` kg is stored as `1500`, so grams and fractional kilos never go
/// through floating point.
///
/// ```rust
/// use engine::Quantity;
///
/// assert_eq!("1.5".parse::<Quantity>().unwrap().thousandths(), 1500);
/// assert_eq!(Quantity::from_units(2).to_string(), "2");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    #[must_use]
    pub const fn from_thousandths(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units * 1000)
    }

    #[must_use]
    pub const fn thousandths(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / 1000;
        let frac = abs % 1000;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let frac = format!("{frac:03}");
        write!(f, "{sign}{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl FromStr for Quantity {
    type Err = ValidationError;

    /// Parses a decimal quantity with `.` or `,` and up to 3 decimals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidQuantity(s.trim().to_string());

        let trimmed = s.trim().replace(',', ".");
        if trimmed.is_empty() {
            return Err(invalid());
        }
        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed.as_str(), ""),
        };
        if whole.is_empty()
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
            || frac.len() > 3
        {
            return Err(invalid());
        }

        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<3}");
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(1000)
            .and_then(|v| v.checked_add(frac))
            .map(Quantity)
            .ok_or_else(invalid)
    }
}

/// Unit the quantity of a product is measured in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityUnit {
    Kg,
    G,
    #[default]
    Unit,
}

impl QuantityUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Kg => "kg",
            Self::G => "g",
            Self::Unit => "unit",
        }
    }
}

impl fmt::Display for QuantityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for QuantityUnit {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "kg" => Ok(Self::Kg),
            "g" => Ok(Self::G),
            "unit" | "units" | "u" => Ok(Self::Unit),
            other => Err(ValidationError::InvalidQuantity(format!(
                "unknown unit: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        assert_eq!("2".parse::<Quantity>().unwrap(), Quantity::from_units(2));
        assert_eq!("0,25".parse::<Quantity>().unwrap().thousandths(), 250);
        assert_eq!("1.005".parse::<Quantity>().unwrap().to_string(), "1.005");
        assert_eq!(Quantity::from_thousandths(1500).to_string(), "1.5");
        assert!("1.0005".parse::<Quantity>().is_err());
        assert!("-1".parse::<Quantity>().is_err());
        assert!("".parse::<Quantity>().is_err());
    }

    #[test]
    fn unit_codes() {
        assert_eq!(QuantityUnit::try_from("KG").unwrap(), QuantityUnit::Kg);
        assert_eq!(QuantityUnit::try_from("units").unwrap(), QuantityUnit::Unit);
        assert!(QuantityUnit::try_from("lb").is_err());
    }
}

//! Fixed set of product categories.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{ValidationError, util::normalize_key};

/// Category a product is filed under.
///
/// The set is closed: reports rank categories and the add-product form
/// offers exactly these choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FruitsVegetables,
    MeatFish,
    DairyEggs,
    Bakery,
    Pantry,
    Beverages,
    Frozen,
    Cleaning,
    PersonalCare,
    Other,
}

/// Extra spellings accepted on input, as normalized keys.
const ALIASES: &[(&str, Category)] = &[
    ("produce", Category::FruitsVegetables),
    ("fruit", Category::FruitsVegetables),
    ("vegetables", Category::FruitsVegetables),
    ("meat", Category::MeatFish),
    ("fish", Category::MeatFish),
    ("dairy", Category::DairyEggs),
    ("bread", Category::Bakery),
    ("drinks", Category::Beverages),
    ("household", Category::Cleaning),
    ("hygiene", Category::PersonalCare),
];

impl Category {
    pub const ALL: [Category; 10] = [
        Self::FruitsVegetables,
        Self::MeatFish,
        Self::DairyEggs,
        Self::Bakery,
        Self::Pantry,
        Self::Beverages,
        Self::Frozen,
        Self::Cleaning,
        Self::PersonalCare,
        Self::Other,
    ];

    /// Canonical code, as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FruitsVegetables => "fruits_vegetables",
            Self::MeatFish => "meat_fish",
            Self::DairyEggs => "dairy_eggs",
            Self::Bakery => "bakery",
            Self::Pantry => "pantry",
            Self::Beverages => "beverages",
            Self::Frozen => "frozen",
            Self::Cleaning => "cleaning",
            Self::PersonalCare => "personal_care",
            Self::Other => "other",
        }
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::FruitsVegetables => "Fruits & Vegetables",
            Self::MeatFish => "Meat & Fish",
            Self::DairyEggs => "Dairy & Eggs",
            Self::Bakery => "Bakery",
            Self::Pantry => "Pantry",
            Self::Beverages => "Beverages",
            Self::Frozen => "Frozen",
            Self::Cleaning => "Cleaning",
            Self::PersonalCare => "Personal Care",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl TryFrom<&str> for Category {
    type Error = ValidationError;

    /// Accepts the code, the display name or a known alias, ignoring case,
    /// accents and punctuation.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let key = normalize_key(value).ok_or(ValidationError::MissingField("category"))?;

        Self::ALL
            .into_iter()
            .find(|category| {
                normalize_key(category.as_str()).as_deref() == Some(key.as_str())
                    || normalize_key(category.display_name()).as_deref() == Some(key.as_str())
            })
            .or_else(|| {
                ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == key)
                    .map(|(_, category)| *category)
            })
            .ok_or_else(|| ValidationError::InvalidCategory(value.trim().to_string()))
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_names_and_aliases() {
        assert_eq!(Category::try_from("dairy_eggs").unwrap(), Category::DairyEggs);
        assert_eq!(
            Category::try_from("  fruits & VEGETABLES").unwrap(),
            Category::FruitsVegetables
        );
        assert_eq!(Category::try_from("Drinks").unwrap(), Category::Beverages);
        assert_eq!(
            Category::try_from(""),
            Err(ValidationError::MissingField("category"))
        );
        assert!(matches!(
            Category::try_from("toys"),
            Err(ValidationError::InvalidCategory(_))
        ));
    }

    #[test]
    fn codes_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::try_from(category.as_str()).unwrap(), category);
        }
    }
}

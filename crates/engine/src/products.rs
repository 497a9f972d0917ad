//! Products bought in a purchase list.
//!
//! A `Product` is created from a validated [`ProductDraft`] and keeps a stable
//! `id` for its whole life, so edits and removals never depend on its
//! position in the list.

use chrono::NaiveDate;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Category, Money, Quantity, QuantityUnit, StoreError, ValidationError,
    util::{optional_text, required_text},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub store: String,
    pub name: String,
    pub price: Money,
    pub purchase_date: NaiveDate,
    pub quantity: Quantity,
    pub quantity_unit: QuantityUnit,
    pub category: Category,
    pub brand: Option<String>,
    /// Inactive products stay in the list but do not count toward its total.
    pub active: bool,
}

/// Raw state of the add/edit product form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductDraft {
    pub store: String,
    pub name: String,
    pub price: Money,
    pub purchase_date: Option<NaiveDate>,
    pub quantity: Quantity,
    pub quantity_unit: QuantityUnit,
    pub category: Option<Category>,
    pub brand: Option<String>,
}

/// Draft fields after validation.
struct ValidDraft {
    store: String,
    name: String,
    price: Money,
    purchase_date: NaiveDate,
    quantity: Quantity,
    quantity_unit: QuantityUnit,
    category: Category,
    brand: Option<String>,
}

impl ProductDraft {
    fn validate(&self) -> Result<ValidDraft, ValidationError> {
        let store = required_text(&self.store, "store")?;
        let name = required_text(&self.name, "name")?;
        let category = self.category.ok_or(ValidationError::MissingField("category"))?;
        if !self.price.is_positive() {
            return Err(ValidationError::NotPositive("price"));
        }
        if !self.quantity.is_positive() {
            return Err(ValidationError::NotPositive("quantity"));
        }
        let purchase_date = self
            .purchase_date
            .ok_or(ValidationError::MissingField("purchase_date"))?;

        Ok(ValidDraft {
            store,
            name,
            price: self.price,
            purchase_date,
            quantity: self.quantity,
            quantity_unit: self.quantity_unit,
            category,
            brand: optional_text(self.brand.as_deref()),
        })
    }

    /// Empty the form, keeping the store name for the next product.
    pub fn clear_keeping_store(&mut self) {
        *self = Self {
            store: std::mem::take(&mut self.store),
            ..Self::default()
        };
    }
}

impl Product {
    /// Build an active product with a fresh id from a draft.
    pub fn from_draft(draft: &ProductDraft) -> Result<Self, ValidationError> {
        let valid = draft.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            store: valid.store,
            name: valid.name,
            price: valid.price,
            purchase_date: valid.purchase_date,
            quantity: valid.quantity,
            quantity_unit: valid.quantity_unit,
            category: valid.category,
            brand: valid.brand,
            active: true,
        })
    }

    /// Replace the editable fields with the draft ones.
    ///
    /// `id` and `active` are kept: editing a deactivated product does not
    /// bring it back.
    pub fn apply_draft(&mut self, draft: &ProductDraft) -> Result<(), ValidationError> {
        let valid = draft.validate()?;
        self.store = valid.store;
        self.name = valid.name;
        self.price = valid.price;
        self.purchase_date = valid.purchase_date;
        self.quantity = valid.quantity;
        self.quantity_unit = valid.quantity_unit;
        self.category = valid.category;
        self.brand = valid.brand;
        Ok(())
    }

    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            store: self.store.clone(),
            name: self.name.clone(),
            price: self.price,
            purchase_date: Some(self.purchase_date),
            quantity: self.quantity,
            quantity_unit: self.quantity_unit,
            category: Some(self.category),
            brand: self.brand.clone(),
        }
    }

    pub(crate) fn to_active_model(&self, list_id: Uuid, position: i32) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id),
            list_id: ActiveValue::Set(list_id),
            position: ActiveValue::Set(position),
            store: ActiveValue::Set(self.store.clone()),
            name: ActiveValue::Set(self.name.clone()),
            price_minor: ActiveValue::Set(self.price.cents()),
            purchase_date: ActiveValue::Set(self.purchase_date),
            quantity_milli: ActiveValue::Set(self.quantity.thousandths()),
            quantity_unit: ActiveValue::Set(self.quantity_unit.as_str().to_string()),
            category: ActiveValue::Set(self.category.as_str().to_string()),
            brand: ActiveValue::Set(self.brand.clone()),
            active: ActiveValue::Set(self.active),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub list_id: Uuid,
    pub position: i32,
    pub store: String,
    pub name: String,
    pub price_minor: i64,
    pub purchase_date: Date,
    pub quantity_milli: i64,
    pub quantity_unit: String,
    pub category: String,
    pub brand: Option<String>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lists::Entity",
        from = "Column::ListId",
        to = "super::lists::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    List,
}

impl Related<super::lists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::List.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Product {
    type Error = StoreError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = model.id;
        let corrupt = |err: ValidationError| StoreError::Corrupt(format!("product {id}: {err}"));
        Ok(Self {
            id,
            quantity_unit: QuantityUnit::try_from(model.quantity_unit.as_str()).map_err(corrupt)?,
            category: Category::try_from(model.category.as_str()).map_err(corrupt)?,
            store: model.store,
            name: model.name,
            price: Money::new(model.price_minor),
            purchase_date: model.purchase_date,
            quantity: Quantity::from_thousandths(model.quantity_milli),
            brand: model.brand,
            active: model.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        ProductDraft {
            store: "Mercado Central".to_string(),
            name: "Milk".to_string(),
            price: Money::new(250),
            purchase_date: NaiveDate::from_ymd_opt(2024, 3, 2),
            quantity: Quantity::from_units(1),
            quantity_unit: QuantityUnit::Unit,
            category: Some(Category::DairyEggs),
            brand: Some("  ".to_string()),
        }
    }

    #[test]
    fn from_draft_trims_and_activates() {
        let product = Product::from_draft(&draft()).unwrap();
        assert!(product.active);
        assert_eq!(product.brand, None);
        assert_eq!(product.to_draft().name, "Milk");
    }

    #[test]
    fn validation_reports_first_problem() {
        let mut d = draft();
        d.store = " ".to_string();
        assert_eq!(
            Product::from_draft(&d),
            Err(ValidationError::MissingField("store"))
        );

        let mut d = draft();
        d.category = None;
        assert_eq!(
            Product::from_draft(&d),
            Err(ValidationError::MissingField("category"))
        );

        let mut d = draft();
        d.price = Money::ZERO;
        assert_eq!(Product::from_draft(&d), Err(ValidationError::NotPositive("price")));

        let mut d = draft();
        d.quantity = Quantity::ZERO;
        assert_eq!(
            Product::from_draft(&d),
            Err(ValidationError::NotPositive("quantity"))
        );

        let mut d = draft();
        d.purchase_date = None;
        assert_eq!(
            Product::from_draft(&d),
            Err(ValidationError::MissingField("purchase_date"))
        );
    }

    #[test]
    fn apply_draft_keeps_identity_and_active_flag() {
        let mut product = Product::from_draft(&draft()).unwrap();
        product.active = false;
        let id = product.id;

        let mut edited = draft();
        edited.price = Money::new(300);
        product.apply_draft(&edited).unwrap();

        assert_eq!(product.id, id);
        assert!(!product.active);
        assert_eq!(product.price, Money::new(300));
    }

    #[test]
    fn clear_keeping_store() {
        let mut d = draft();
        d.clear_keeping_store();
        assert_eq!(d.store, "Mercado Central");
        assert_eq!(d.name, "");
        assert_eq!(d.category, None);
    }
}

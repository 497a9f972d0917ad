//! Saved purchase lists.
//!
//! A `PurchaseList` caches its `total`; every mutation of `products` goes
//! through a method that recomputes it, and [`compute_total`] is available to
//! check the cached value against the products.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, Product, ResultEngine, StoreError};

/// Identifier assigned to a list by the document store.
pub type ListId = Uuid;

/// Sum of the prices of the active products.
pub fn compute_total(products: &[Product]) -> Money {
    products.iter().filter(|p| p.active).map(|p| p.price).sum()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseList {
    pub id: ListId,
    pub owner_id: String,
    pub store: String,
    pub products: Vec<Product>,
    pub total: Money,
    /// `None` for lists whose creation time is unknown; they are left out of
    /// monthly reports.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PurchaseList {
    /// Returns `true` when the cached total matches the active products.
    pub fn total_is_consistent(&self) -> bool {
        self.total == compute_total(&self.products)
    }

    pub fn product(&self, product_id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    /// Delete a product for good and refresh the total.
    pub fn remove_product(&mut self, product_id: Uuid) -> ResultEngine<Product> {
        match self.products.iter().position(|p| p.id == product_id) {
            Some(index) => {
                let product = self.products.remove(index);
                self.total = compute_total(&self.products);
                Ok(product)
            }
            None => Err(EngineError::KeyNotFound(product_id.to_string())),
        }
    }

    /// Apply a patch the way the document store does, minus `updated_at`.
    pub fn apply_patch(&mut self, patch: &ListPatch) {
        if let Some(store) = &patch.store {
            self.store = store.clone();
        }
        if let Some(products) = &patch.products {
            self.products = products.clone();
        }
        if let Some(total) = patch.total {
            self.total = total;
        }
    }
}

/// Data needed to create a list; the store assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewList {
    pub store: String,
    pub products: Vec<Product>,
    pub total: Money,
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial update of a saved list. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPatch {
    pub store: Option<String>,
    pub products: Option<Vec<Product>>,
    pub total: Option<Money>,
}

impl ListPatch {
    /// Patch replacing the products of `list` along with its total.
    pub fn products_of(list: &PurchaseList) -> Self {
        Self {
            store: None,
            products: Some(list.products.clone()),
            total: Some(list.total),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_none() && self.products.is_none() && self.total.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    pub store: String,
    pub total_minor: i64,
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_new_list(id: ListId, owner_id: &str, list: &NewList) -> Self {
        Self {
            id: ActiveValue::Set(id),
            owner_id: ActiveValue::Set(owner_id.to_string()),
            store: ActiveValue::Set(list.store.clone()),
            total_minor: ActiveValue::Set(list.total.cents()),
            created_at: ActiveValue::Set(list.created_at),
            updated_at: ActiveValue::Set(None),
        }
    }
}

impl TryFrom<(Model, Vec<super::products::Model>)> for PurchaseList {
    type Error = StoreError;

    fn try_from(
        (model, mut product_models): (Model, Vec<super::products::Model>),
    ) -> Result<Self, Self::Error> {
        product_models.sort_by_key(|p| p.position);
        let products = product_models
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: model.id,
            owner_id: model.owner_id,
            store: model.store,
            products,
            total: Money::new(model.total_minor),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

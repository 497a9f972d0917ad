//! The working purchase list.
//!
//! [`ListManager`] owns the list being built before it is committed to the
//! document store. Every mutation recomputes the cached total, so
//! `total() == compute_total(products())` holds between calls.

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    Category, DocumentStore, EngineError, Money, NewList, PersistenceError, Product,
    ProductDraft, PurchaseList, ResultEngine, ValidationError, compute_total,
};

#[derive(Debug, Default)]
pub struct ListManager {
    store: String,
    products: Vec<Product>,
    total: Money,
    draft: ProductDraft,
    editing: Option<Uuid>,
}

impl ListManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the list will be saved under. Set with [`set_store`], or taken
    /// from the first product added while it is still empty.
    ///
    /// [`set_store`]: Self::set_store
    pub fn store(&self) -> &str {
        &self.store
    }

    pub fn set_store(&mut self, store: &str) {
        self.store = store.trim().to_string();
        self.draft.store = self.store.clone();
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product(&self, id: Uuid) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ProductDraft {
        &mut self.draft
    }

    /// Product currently loaded in the draft for editing.
    pub fn editing(&self) -> Option<Uuid> {
        self.editing
    }

    fn refresh_total(&mut self) {
        self.total = compute_total(&self.products);
    }

    fn position(&self, id: Uuid) -> ResultEngine<usize> {
        self.products
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| EngineError::KeyNotFound(id.to_string()))
    }

    fn reset_draft(&mut self) {
        self.draft.clear_keeping_store();
        self.editing = None;
    }

    /// Validate `draft` and append it as an active product.
    ///
    /// On success the draft is cleared, keeping the store name.
    pub fn add_product(&mut self, draft: ProductDraft) -> Result<&Product, ValidationError> {
        let product = Product::from_draft(&draft)?;
        tracing::debug!(product_id = %product.id, name = %product.name, "product added");

        if self.store.is_empty() {
            self.store = product.store.clone();
        }
        self.products.push(product);
        self.refresh_total();
        self.draft = draft;
        self.reset_draft();

        Ok(&self.products[self.products.len() - 1])
    }

    /// Load a product into the draft so it can be edited.
    pub fn begin_edit(&mut self, id: Uuid) -> ResultEngine<&ProductDraft> {
        let index = self.position(id)?;
        self.draft = self.products[index].to_draft();
        self.editing = Some(id);
        Ok(&self.draft)
    }

    /// Drop the edit in progress, if any.
    pub fn cancel_edit(&mut self) {
        if self.editing.is_some() {
            self.reset_draft();
        }
    }

    /// Replace the fields of product `id` with `draft`.
    ///
    /// The `active` flag of the product is left as it was.
    pub fn commit_edit(&mut self, id: Uuid, draft: ProductDraft) -> ResultEngine<()> {
        let index = self.position(id)?;
        self.products[index].apply_draft(&draft)?;
        self.refresh_total();

        if self.editing == Some(id) {
            self.reset_draft();
        }
        tracing::debug!(product_id = %id, "product edited");
        Ok(())
    }

    /// Show or hide a product. Hidden products stay in the list but are not
    /// part of the total.
    pub fn set_active(&mut self, id: Uuid, active: bool) -> ResultEngine<()> {
        let index = self.position(id)?;
        self.products[index].active = active;
        self.refresh_total();
        Ok(())
    }

    /// Delete a product from the list.
    pub fn remove_product(&mut self, id: Uuid) -> ResultEngine<Product> {
        let index = self.position(id)?;
        let product = self.products.remove(index);
        self.refresh_total();
        if self.editing == Some(id) {
            self.reset_draft();
        }
        Ok(product)
    }

    /// Active products of `category`.
    ///
    /// No selection shows nothing: `None` returns an empty vector.
    pub fn filter_by_category(&self, category: Option<Category>) -> Vec<&Product> {
        let Some(category) = category else {
            return Vec::new();
        };
        self.products
            .iter()
            .filter(|p| p.active && p.category == category)
            .collect()
    }

    /// Empty the list, keeping the store name.
    pub fn clear(&mut self) {
        self.products.clear();
        self.refresh_total();
        self.reset_draft();
    }

    /// Persist the working list for `owner_id`, created now.
    ///
    /// The list is cleared only once the store accepted it; on failure the
    /// products are kept so the save can be retried.
    pub async fn save<S: DocumentStore>(
        &mut self,
        store: &S,
        owner_id: &str,
    ) -> Result<PurchaseList, PersistenceError> {
        self.save_at(store, owner_id, Some(Utc::now())).await
    }

    /// Like [`save`](Self::save) with an explicit creation time, for lists
    /// bought earlier. `None` leaves the list out of monthly reports.
    #[instrument(skip(self, store), fields(products = self.products.len()))]
    pub async fn save_at<S: DocumentStore>(
        &mut self,
        store: &S,
        owner_id: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<PurchaseList, PersistenceError> {
        if self.products.is_empty() {
            return Err(PersistenceError::EmptyList);
        }

        let new_list = NewList {
            store: self.store.clone(),
            products: self.products.clone(),
            total: self.total,
            created_at,
        };
        let id = store
            .create_list(owner_id, new_list.clone())
            .await
            .map_err(|err| {
                tracing::error!("failed to save list: {err}");
                PersistenceError::Create(err)
            })?;

        self.clear();
        tracing::info!(list_id = %id, "list saved");

        Ok(PurchaseList {
            id,
            owner_id: owner_id.to_string(),
            store: new_list.store,
            products: new_list.products,
            total: new_list.total,
            created_at: new_list.created_at,
            updated_at: None,
        })
    }
}

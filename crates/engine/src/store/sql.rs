use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::{
    ActiveValue, DatabaseConnection, DatabaseTransaction, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{ListId, ListPatch, NewList, Product, PurchaseList, StoreError, lists, products};

use super::DocumentStore;

/// [`DocumentStore`] over the `lists` and `products` tables.
#[derive(Clone, Debug)]
pub struct SqlDocumentStore {
    database: DatabaseConnection,
}

impl SqlDocumentStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

async fn insert_products(
    db_tx: &DatabaseTransaction,
    list_id: Uuid,
    products: &[Product],
) -> Result<(), StoreError> {
    for (position, product) in products.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| StoreError::Corrupt("too many products in list".to_string()))?;
        product
            .to_active_model(list_id, position)
            .insert(db_tx)
            .await?;
    }
    Ok(())
}

impl DocumentStore for SqlDocumentStore {
    #[instrument(skip(self, list), fields(products = list.products.len()))]
    async fn create_list(&self, owner_id: &str, list: NewList) -> Result<ListId, StoreError> {
        let id = Uuid::new_v4();

        let db_tx = self.database.begin().await?;
        lists::ActiveModel::from_new_list(id, owner_id, &list)
            .insert(&db_tx)
            .await?;
        insert_products(&db_tx, id, &list.products).await?;
        db_tx.commit().await?;

        tracing::debug!(list_id = %id, "list created");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn query_lists_by_owner(&self, owner_id: &str) -> Result<Vec<PurchaseList>, StoreError> {
        let rows = lists::Entity::find()
            .filter(lists::Column::OwnerId.eq(owner_id))
            .order_by_asc(lists::Column::CreatedAt)
            .order_by_asc(lists::Column::Id)
            .find_with_related(products::Entity)
            .all(&self.database)
            .await?;

        rows.into_iter().map(PurchaseList::try_from).collect()
    }

    #[instrument(skip(self, patch))]
    async fn update_list(
        &self,
        list_id: ListId,
        patch: ListPatch,
    ) -> Result<DateTime<Utc>, StoreError> {
        let db_tx = self.database.begin().await?;

        let model = lists::Entity::find_by_id(list_id)
            .one(&db_tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("list {list_id}")))?;

        let mut active: lists::ActiveModel = model.into();
        if let Some(store) = patch.store {
            active.store = ActiveValue::Set(store);
        }
        if let Some(total) = patch.total {
            active.total_minor = ActiveValue::Set(total.cents());
        }
        // Microseconds survive the round trip through the database.
        let updated_at = Utc::now().trunc_subsecs(6);
        active.updated_at = ActiveValue::Set(Some(updated_at));
        active.update(&db_tx).await?;

        if let Some(products) = patch.products {
            products::Entity::delete_many()
                .filter(products::Column::ListId.eq(list_id))
                .exec(&db_tx)
                .await?;
            insert_products(&db_tx, list_id, &products).await?;
        }

        db_tx.commit().await?;
        Ok(updated_at)
    }
}

//! Document store collaborator.
//!
//! The engine never talks to a database directly: saved lists go through a
//! [`DocumentStore`]. [`SqlDocumentStore`] is the implementation backed by
//! sea-orm.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{ListId, ListPatch, NewList, PurchaseList, StoreError};

mod sql;

pub use sql::SqlDocumentStore;

/// Remote storage for purchase lists.
pub trait DocumentStore {
    /// Persist a new list owned by `owner_id` and return its id.
    fn create_list(
        &self,
        owner_id: &str,
        list: NewList,
    ) -> impl Future<Output = Result<ListId, StoreError>> + Send;

    /// All the lists owned by `owner_id`, oldest first.
    fn query_lists_by_owner(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Vec<PurchaseList>, StoreError>> + Send;

    /// Apply `patch` to the list and stamp its `updated_at`, which is
    /// returned.
    fn update_list(
        &self,
        list_id: ListId,
        patch: ListPatch,
    ) -> impl Future<Output = Result<DateTime<Utc>, StoreError>> + Send;
}

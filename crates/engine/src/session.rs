//! Per-user state behind the list and report views.
//!
//! A [`Session`] follows the auth state of its [`AuthProvider`]: signing out
//! clears everything and sends the user back to the landing view, signing in
//! loads the saved lists once. All mutations take `&mut self`; a host sharing
//! a session between tasks wraps it in a `tokio::sync::Mutex`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::{
    AuthProvider, AuthSubscription, DocumentStore, EngineError, ListId, ListManager, ListPatch,
    MonthYear, PersistenceError, ProductView, PurchaseList, ReportSummary, ResultEngine, User,
    flatten_products, list_history, price_trend, summarize_in,
};

/// Progress of the one-shot fetch of the saved lists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    /// The fetch failed; the next `ensure_loaded` tries again.
    Failed(String),
}

/// Where the host should send the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Landing,
    Lists,
}

#[derive(Debug)]
pub struct Session<A: AuthProvider, S: DocumentStore> {
    auth: A,
    store: S,
    subscription: Option<AuthSubscription>,
    timezone: Tz,
    user: Option<User>,
    lists: Vec<PurchaseList>,
    summary: ReportSummary,
    working: ListManager,
    load_state: LoadState,
}

impl<A: AuthProvider, S: DocumentStore> Session<A, S> {
    pub fn new(auth: A, store: S) -> Self {
        Self {
            auth,
            store,
            subscription: None,
            timezone: Tz::UTC,
            user: None,
            lists: Vec::new(),
            summary: ReportSummary::default(),
            working: ListManager::new(),
            load_state: LoadState::NotLoaded,
        }
    }

    /// Bucket monthly figures in `timezone` instead of UTC.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self.refresh_summary();
        self
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn lists(&self) -> &[PurchaseList] {
        &self.lists
    }

    pub fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    pub fn working(&self) -> &ListManager {
        &self.working
    }

    pub fn working_mut(&mut self) -> &mut ListManager {
        &mut self.working
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Every saved product with the list it belongs to.
    pub fn products(&self) -> Vec<ProductView> {
        flatten_products(&self.lists)
    }

    pub fn price_trend(&self, name: &str) -> BTreeMap<MonthYear, f64> {
        price_trend(&self.products(), name)
    }

    /// Saved lists, newest first.
    pub fn history(&self) -> Vec<&PurchaseList> {
        list_history(&self.lists)
    }

    /// Start following the auth state. Does nothing when already attached.
    pub fn attach(&mut self) {
        if self.subscription.is_none() {
            self.subscription = Some(self.auth.on_auth_state_changed());
            tracing::debug!("session attached to auth state");
        }
    }

    /// Stop following the auth state.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            tracing::debug!("session detached from auth state");
        }
    }

    fn owner_id(&self) -> ResultEngine<String> {
        self.user
            .as_ref()
            .map(|u| u.id.clone())
            .ok_or(EngineError::Unauthenticated)
    }

    fn refresh_summary(&mut self) {
        self.summary = summarize_in(&self.lists, &self.timezone);
    }

    fn reset(&mut self) {
        self.lists.clear();
        self.summary = ReportSummary::default();
        self.working = ListManager::new();
        self.load_state = LoadState::NotLoaded;
    }

    /// Apply the latest auth state. A detached session sees no user.
    pub async fn sync_auth(&mut self) -> View {
        let current = self
            .subscription
            .as_mut()
            .and_then(AuthSubscription::current);
        self.apply_auth(current).await
    }

    /// Wait for the next auth change and apply it. `None` once detached or
    /// when the provider is gone.
    pub async fn next_auth_change(&mut self) -> Option<View> {
        let change = self.subscription.as_mut()?.changed().await?;
        Some(self.apply_auth(change).await)
    }

    async fn apply_auth(&mut self, user: Option<User>) -> View {
        let Some(user) = user else {
            if self.user.take().is_some() {
                tracing::info!("user signed out, clearing session");
            }
            self.reset();
            return View::Landing;
        };

        if self.user.as_ref().is_none_or(|current| current.id != user.id) {
            tracing::info!(user_id = %user.id, "new user in session");
            self.reset();
        }
        self.user = Some(user);

        if let Err(err) = self.ensure_loaded().await {
            tracing::warn!("could not load saved lists: {err}");
        }
        View::Lists
    }

    /// Fetch the saved lists of the user unless they are loaded already.
    pub async fn ensure_loaded(&mut self) -> ResultEngine<()> {
        let owner_id = self.owner_id()?;
        if matches!(self.load_state, LoadState::Loading | LoadState::Loaded) {
            return Ok(());
        }

        self.load_state = LoadState::Loading;
        match self.store.query_lists_by_owner(&owner_id).await {
            Ok(lists) => {
                tracing::debug!(lists = lists.len(), "saved lists loaded");
                self.lists = lists;
                self.refresh_summary();
                self.load_state = LoadState::Loaded;
                Ok(())
            }
            Err(err) => {
                self.load_state = LoadState::Failed(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Save the working list and add it to the saved ones.
    pub async fn save_working_list(&mut self) -> ResultEngine<&PurchaseList> {
        self.save_working_list_at(Some(Utc::now())).await
    }

    /// Save the working list with an explicit creation time.
    pub async fn save_working_list_at(
        &mut self,
        created_at: Option<DateTime<Utc>>,
    ) -> ResultEngine<&PurchaseList> {
        let owner_id = self.owner_id()?;
        let list = self.working.save_at(&self.store, &owner_id, created_at).await?;
        self.lists.push(list);
        self.refresh_summary();
        Ok(&self.lists[self.lists.len() - 1])
    }

    /// Delete a product from a saved list and persist the list.
    ///
    /// The local copy changes only after the store accepted the update.
    pub async fn remove_saved_product(
        &mut self,
        list_id: ListId,
        product_id: Uuid,
    ) -> ResultEngine<()> {
        self.owner_id()?;
        let index = self
            .lists
            .iter()
            .position(|l| l.id == list_id)
            .ok_or_else(|| EngineError::KeyNotFound(list_id.to_string()))?;

        let mut updated = self.lists[index].clone();
        updated.remove_product(product_id)?;
        let updated_at = self
            .store
            .update_list(list_id, ListPatch::products_of(&updated))
            .await
            .map_err(PersistenceError::Update)?;

        updated.updated_at = Some(updated_at);
        self.lists[index] = updated;
        self.refresh_summary();
        tracing::info!(list_id = %list_id, product_id = %product_id, "product removed from saved list");
        Ok(())
    }

    /// Sign out, stop following the auth state and clear the session.
    pub async fn sign_out(&mut self) -> View {
        self.auth.sign_out().await;
        self.detach();
        self.user = None;
        self.reset();
        View::Landing
    }
}

impl<A: AuthProvider, S: DocumentStore> Drop for Session<A, S> {
    fn drop(&mut self) {
        self.detach();
    }
}

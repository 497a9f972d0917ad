//! Identity provider collaborator.
//!
//! Views are gated on the current user, which every [`AuthProvider`]
//! broadcasts through [`AuthSubscription`]s. [`LocalAuth`] keeps accounts in
//! the `users` table, with passwords stored as argon2id PHC strings.

use std::{fmt, future::Future, sync::Arc};

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveValue, DatabaseConnection, QueryFilter, prelude::*};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::instrument;
use uuid::Uuid;

use crate::{AuthError, Country, users};

const MIN_PASSWORD_LEN: usize = 6;

/// Third-party identity providers offered as popup sign-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Google,
    Facebook,
    GitHub,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Google => "Google",
            Self::Facebook => "Facebook",
            Self::GitHub => "GitHub",
        })
    }
}

/// An authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// `None` for email/password accounts.
    pub provider: Option<ProviderKind>,
}

/// Profile fields that can be changed after the account exists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub country: Option<Country>,
}

/// Receives auth state changes until dropped.
///
/// Dropping the subscription (or calling [`unsubscribe`]) stops delivery.
///
/// [`unsubscribe`]: AuthSubscription::unsubscribe
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: watch::Receiver<Option<User>>,
}

impl AuthSubscription {
    pub fn new(receiver: watch::Receiver<Option<User>>) -> Self {
        Self { receiver }
    }

    /// Latest state, marking it as seen.
    pub fn current(&mut self) -> Option<User> {
        self.receiver.borrow_and_update().clone()
    }

    /// Wait for the next change. `None` when the provider is gone.
    pub async fn changed(&mut self) -> Option<Option<User>> {
        self.receiver.changed().await.ok()?;
        Some(self.current())
    }

    /// Stop receiving changes. Dropping the receiver is what unsubscribes.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

/// Identity provider used to gate list and report views.
pub trait AuthProvider {
    fn sign_in_with_email_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    fn sign_in_with_popup(
        &self,
        kind: ProviderKind,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    /// Check that `create_account` would accept `email` and `password`,
    /// without creating anything.
    fn check_new_account(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;

    /// Create an email/password account and sign it in.
    fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> impl Future<Output = Result<User, AuthError>> + Send;

    fn sign_out(&self) -> impl Future<Output = ()> + Send;

    /// Subscribe to sign-in/sign-out events. The current state is delivered
    /// first.
    fn on_auth_state_changed(&self) -> AuthSubscription;
}

/// Account store on the local database.
#[derive(Clone, Debug)]
pub struct LocalAuth {
    database: DatabaseConnection,
    state: Arc<watch::Sender<Option<User>>>,
}

impl LocalAuth {
    pub fn new(database: DatabaseConnection) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            database,
            state: Arc::new(state),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().clone()
    }

    fn publish(&self, user: Option<User>) {
        self.state.send_replace(user);
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, AuthError> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.database)
            .await?)
    }

    /// Normalized email for a new account, once the password is strong
    /// enough and the email is still free.
    async fn new_account_email(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered(email));
        }
        Ok(email)
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AuthError::InvalidEmail(email)),
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|err| AuthError::Hashing(err.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AuthError::Hashing(err.to_string()))?;
    Ok(hash.to_string())
}

/// Compares in constant time; a malformed stored hash is an error, not a
/// mismatch.
fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|err| AuthError::Hashing(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id.to_string(),
            email: model.email,
            display_name: model.display_name,
            photo_url: model.photo_url,
            provider: None,
        }
    }
}

impl AuthProvider for LocalAuth {
    #[instrument(skip(self, password))]
    async fn sign_in_with_email_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        let model = self
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &model.password_hash)? {
            tracing::warn!("wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let user = User::from(model);
        self.publish(Some(user.clone()));
        tracing::info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    async fn sign_in_with_popup(&self, kind: ProviderKind) -> Result<User, AuthError> {
        tracing::warn!("{kind} sign-in requested but no federated provider is configured");
        Err(AuthError::ProviderUnavailable(kind))
    }

    #[instrument(skip(self, password))]
    async fn check_new_account(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.new_account_email(email, password).await.map(|_| ())
    }

    #[instrument(skip(self, password))]
    async fn create_account(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = self.new_account_email(email, password).await?;

        let model = users::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            email: ActiveValue::Set(email),
            password_hash: ActiveValue::Set(hash_password(password)?),
            display_name: ActiveValue::Set(None),
            photo_url: ActiveValue::Set(None),
            birthdate: ActiveValue::Set(None),
            country: ActiveValue::Set(None),
            created_at: ActiveValue::Set(Utc::now()),
        }
        .insert(&self.database)
        .await?;

        let user = User::from(model);
        self.publish(Some(user.clone()));
        tracing::info!(user_id = %user.id, "account created");
        Ok(user)
    }

    #[instrument(skip(self, update))]
    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<User, AuthError> {
        let id = Uuid::parse_str(user_id).map_err(|_| AuthError::InvalidCredentials)?;
        let model = users::Entity::find_by_id(id)
            .one(&self.database)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let mut active: users::ActiveModel = model.into();
        if let Some(name) = update.display_name {
            active.display_name = ActiveValue::Set(Some(name));
        }
        if let Some(url) = update.photo_url {
            active.photo_url = ActiveValue::Set(Some(url));
        }
        if let Some(birthdate) = update.birthdate {
            active.birthdate = ActiveValue::Set(Some(birthdate));
        }
        if let Some(country) = update.country {
            active.country = ActiveValue::Set(Some(country.code().to_string()));
        }
        let user = User::from(active.update(&self.database).await?);

        if self
            .current_user()
            .is_some_and(|current| current.id == user.id)
        {
            self.publish(Some(user.clone()));
        }
        Ok(user)
    }

    async fn sign_out(&self) {
        self.publish(None);
        tracing::info!("signed out");
    }

    fn on_auth_state_changed(&self) -> AuthSubscription {
        AuthSubscription::new(self.state.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email(" Ana@Example.COM ").unwrap(), "ana@example.com");
        assert!(matches!(
            normalize_email("not-an-email"),
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(normalize_email("@example.com").is_err());
    }

    #[test]
    fn password_hashes_are_salted_phc_strings() {
        let first = hash_password("secret1").unwrap();
        let second = hash_password("secret1").unwrap();
        assert!(first.starts_with("$argon2id$"));
        assert!(!first.contains("secret1"));
        assert_ne!(first, second);

        assert!(verify_password("secret1", &first).unwrap());
        assert!(verify_password("secret1", &second).unwrap());
        assert!(!verify_password("secret2", &first).unwrap());
        assert!(matches!(
            verify_password("secret1", "not-a-hash"),
            Err(AuthError::Hashing(_))
        ));
    }
}

//! The module contains the errors the engine can throw.
//!
//! Each collaborator-facing operation has its own error family:
//!
//! - [`ValidationError`] for form input that is missing or out of range.
//! - [`AuthError`] for identity failures.
//! - [`PersistenceError`] when saving or updating a list fails.
//! - [`StoreError`] for document and blob store failures.
//!
//! [`EngineError`] wraps all of them for callers that do not care which
//! family failed.
use sea_orm::DbErr;
use thiserror::Error;

use crate::auth::ProviderKind;

/// A form field is missing or holds an invalid value.
///
/// Validation never mutates state, the caller can fix the input and retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("\"{0}\" is required")]
    MissingField(&'static str),
    #[error("\"{0}\" must be greater than zero")]
    NotPositive(&'static str),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("{0}")]
    Mismatch(String),
}

/// Identity provider failures.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("\"{0}\" is already registered")]
    EmailAlreadyRegistered(String),
    #[error("Password must be at least 6 characters long")]
    WeakPassword,
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("{0} sign-in is not available")]
    ProviderUnavailable(ProviderKind),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Document and blob store failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("\"{0}\" not found")]
    NotFound(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Saving or updating a purchase list failed.
///
/// The working list is left untouched so the user can retry.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("The list has no products to save")]
    EmptyList,
    #[error("Failed to create list: {0}")]
    Create(#[source] StoreError),
    #[error("Failed to update list: {0}")]
    Update(#[source] StoreError),
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("No authenticated user")]
    Unauthenticated,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Returns `true` when the failure deserves the "already registered" hint.
    #[must_use]
    pub fn is_already_registered(&self) -> bool {
        matches!(self, Self::EmailAlreadyRegistered(_))
    }
}

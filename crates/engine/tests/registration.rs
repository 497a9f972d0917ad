use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use std::path::Path;

use engine::{
    AuthError, AuthProvider, AuthSubscription, BlobStore, Country, EngineError, LocalAuth,
    LocalBlobStore, ProfilePicture, ProfileUpdate, ProviderKind, RegistrationForm, StoreError,
    User, ValidationError, register,
};
use migration::MigratorTrait;

async fn auth_with_db() -> (LocalAuth, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    (LocalAuth::new(db.clone()), db)
}

/// Blob store whose uploads always fail.
struct BrokenBlobs;

impl BlobStore for BrokenBlobs {
    async fn upload(&self, _path: &str, _bytes: Vec<u8>) -> Result<String, StoreError> {
        Err(StoreError::Io(std::io::Error::other("disk full")))
    }

    async fn delete(&self, _path: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Accounts whose checks pass but whose creation loses a race with another
/// sign-up of the same email.
struct RacedSignup(LocalAuth);

impl AuthProvider for RacedSignup {
    async fn sign_in_with_email_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        self.0.sign_in_with_email_password(email, password).await
    }

    async fn sign_in_with_popup(&self, kind: ProviderKind) -> Result<User, AuthError> {
        self.0.sign_in_with_popup(kind).await
    }

    async fn check_new_account(&self, email: &str, password: &str) -> Result<(), AuthError> {
        self.0.check_new_account(email, password).await
    }

    async fn create_account(&self, email: &str, _password: &str) -> Result<User, AuthError> {
        Err(AuthError::EmailAlreadyRegistered(email.to_string()))
    }

    async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<User, AuthError> {
        self.0.update_profile(user_id, update).await
    }

    async fn sign_out(&self) {
        self.0.sign_out().await;
    }

    fn on_auth_state_changed(&self) -> AuthSubscription {
        self.0.on_auth_state_changed()
    }
}

fn stored_pictures(root: &Path) -> usize {
    match std::fs::read_dir(root.join("profile_pictures")) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn form(email: &str) -> RegistrationForm {
    RegistrationForm {
        name: " Ana María ".to_string(),
        email: email.to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
        birthdate: NaiveDate::from_ymd_opt(1992, 8, 30),
        country: Some(Country::Mexico),
        picture: ProfilePicture {
            file_name: "avatar.png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        },
        accepted_terms: true,
    }
}

#[tokio::test]
async fn registration_uploads_picture_and_signs_in() {
    let (auth, _db) = auth_with_db().await;
    let dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(dir.path());
    let mut changes = auth.on_auth_state_changed();

    let user = register(&auth, &blobs, form("Ana@Example.com")).await.unwrap();

    assert_eq!(user.email, "ana@example.com");
    assert_eq!(user.display_name.as_deref(), Some("Ana María"));
    let url = user.photo_url.clone().unwrap();
    assert!(url.starts_with("file://"));
    assert!(url.ends_with("/avatar.png"));
    let path = url.trim_start_matches("file://");
    assert_eq!(std::fs::read(path).unwrap(), vec![0x89, b'P', b'N', b'G']);

    assert_eq!(changes.current(), Some(user.clone()));
    assert_eq!(auth.current_user(), Some(user));
}

#[tokio::test]
async fn duplicate_email_is_reported() {
    let (auth, _db) = auth_with_db().await;
    let dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(dir.path());
    register(&auth, &blobs, form("ana@example.com")).await.unwrap();

    let err = register(&auth, &blobs, form("ANA@example.com"))
        .await
        .unwrap_err();
    match err {
        EngineError::Auth(err) => {
            assert!(err.is_already_registered());
            assert!(matches!(err, AuthError::EmailAlreadyRegistered(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(stored_pictures(dir.path()), 1);
}

#[tokio::test]
async fn rejected_accounts_upload_nothing() {
    let (auth, _db) = auth_with_db().await;
    let dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(dir.path());

    let mut weak = form("ana@example.com");
    weak.password = "123".to_string();
    weak.confirm_password = "123".to_string();
    assert!(matches!(
        register(&auth, &blobs, weak).await,
        Err(EngineError::Auth(AuthError::WeakPassword))
    ));
    assert!(matches!(
        register(&auth, &blobs, form("ana")).await,
        Err(EngineError::Auth(AuthError::InvalidEmail(_)))
    ));
    assert_eq!(stored_pictures(dir.path()), 0);
}

#[tokio::test]
async fn failed_account_creation_removes_the_picture() {
    let (auth, _db) = auth_with_db().await;
    let dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(dir.path());

    let err = register(&RacedSignup(auth.clone()), &blobs, form("ana@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Auth(AuthError::EmailAlreadyRegistered(_))
    ));
    assert_eq!(stored_pictures(dir.path()), 0);
    assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn failed_upload_creates_no_account() {
    let (auth, _db) = auth_with_db().await;

    let err = register(&auth, &BrokenBlobs, form("ana@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::Io(_))));
    assert!(auth.current_user().is_none());
    assert!(matches!(
        auth.sign_in_with_email_password("ana@example.com", "secret1")
            .await,
        Err(AuthError::InvalidCredentials)
    ));

    // Retrying with a working store succeeds.
    let dir = tempfile::tempdir().unwrap();
    register(&auth, &LocalBlobStore::new(dir.path()), form("ana@example.com"))
        .await
        .unwrap();
}

#[tokio::test]
async fn invalid_forms_touch_nothing() {
    let (auth, _db) = auth_with_db().await;
    let dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(dir.path());

    let mut mismatch = form("ana@example.com");
    mismatch.confirm_password = "secret2".to_string();
    let err = register(&auth, &blobs, mismatch).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::Mismatch(_))
    ));

    let mut no_terms = form("ana@example.com");
    no_terms.accepted_terms = false;
    assert!(register(&auth, &blobs, no_terms).await.is_err());

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn sign_in_checks_password() {
    let (auth, _db) = auth_with_db().await;
    let created = auth.create_account("bob@example.com", "hunter22").await.unwrap();
    auth.sign_out().await;
    assert!(auth.current_user().is_none());

    assert!(matches!(
        auth.sign_in_with_email_password("bob@example.com", "wrong-one").await,
        Err(AuthError::InvalidCredentials)
    ));
    let user = auth
        .sign_in_with_email_password(" BOB@example.com", "hunter22")
        .await
        .unwrap();
    assert_eq!(user.id, created.id);
    assert_eq!(auth.current_user(), Some(user));
}

#[tokio::test]
async fn weak_passwords_and_popups_are_refused() {
    let (auth, _db) = auth_with_db().await;

    assert!(matches!(
        auth.create_account("bob@example.com", "123").await,
        Err(AuthError::WeakPassword)
    ));
    assert!(matches!(
        auth.create_account("bob", "secret1").await,
        Err(AuthError::InvalidEmail(_))
    ));
    assert!(matches!(
        auth.sign_in_with_popup(ProviderKind::GitHub).await,
        Err(AuthError::ProviderUnavailable(ProviderKind::GitHub))
    ));
}

#[tokio::test]
async fn blob_store_keeps_uploads_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = LocalBlobStore::new(dir.path());

    let url = blobs
        .upload("profile_pictures/a/b.png", vec![1, 2, 3])
        .await
        .unwrap();
    assert!(url.starts_with("file://"));
    assert!(dir.path().join("profile_pictures/a/b.png").exists());

    assert!(matches!(
        blobs.upload("../outside.png", vec![1]).await,
        Err(StoreError::InvalidPath(_))
    ));
    assert!(!dir.path().join("../outside.png").exists());

    blobs.delete("profile_pictures/a/b.png").await.unwrap();
    assert!(!dir.path().join("profile_pictures/a").exists());
    assert!(dir.path().join("profile_pictures").exists());
    assert!(matches!(
        blobs.delete("profile_pictures/a/b.png").await,
        Err(StoreError::Io(_))
    ));
}

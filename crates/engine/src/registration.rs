//! Account registration.
//!
//! The account checks run before the profile picture is uploaded, and the
//! picture is uploaded before the account is created. A failed upload leaves
//! no account; a failed account creation leaves no picture.

use std::{fmt, path::Path};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    AuthProvider, BlobStore, ProfileUpdate, ResultEngine, User, ValidationError,
    util::required_text,
};

/// Countries offered by the registration form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Country {
    Mexico,
    Colombia,
    Argentina,
}

impl Country {
    pub fn code(self) -> &'static str {
        match self {
            Self::Mexico => "mx",
            Self::Colombia => "co",
            Self::Argentina => "ar",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mexico => "Mexico",
            Self::Colombia => "Colombia",
            Self::Argentina => "Argentina",
        })
    }
}

impl TryFrom<&str> for Country {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mx" | "mexico" => Ok(Self::Mexico),
            "co" | "colombia" => Ok(Self::Colombia),
            "ar" | "argentina" => Ok(Self::Argentina),
            "" => Err(ValidationError::MissingField("country")),
            other => Err(ValidationError::Mismatch(format!(
                "unsupported country: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfilePicture {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Content of the sign-up form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub birthdate: Option<NaiveDate>,
    pub country: Option<Country>,
    pub picture: ProfilePicture,
    pub accepted_terms: bool,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        required_text(&self.name, "name")?;
        required_text(&self.email, "email")?;
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::Mismatch(
                "passwords do not match".to_string(),
            ));
        }
        let birthdate = self
            .birthdate
            .ok_or(ValidationError::MissingField("birthdate"))?;
        if birthdate > Utc::now().date_naive() {
            return Err(ValidationError::Mismatch(
                "birthdate is in the future".to_string(),
            ));
        }
        self.country.ok_or(ValidationError::MissingField("country"))?;
        if self.picture.bytes.is_empty() {
            return Err(ValidationError::MissingField("picture"));
        }
        if !self.accepted_terms {
            return Err(ValidationError::MissingField("terms"));
        }
        Ok(())
    }
}

/// Storage path for an uploaded picture; only the file name of the upload is
/// kept.
fn picture_path(file_name: &str) -> String {
    let name = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or("picture");
    format!("profile_pictures/{}/{name}", Uuid::new_v4().simple())
}

/// Validate the form, upload the picture, create the account and attach the
/// profile data to it.
#[instrument(skip_all)]
pub async fn register<A, B>(auth: &A, blobs: &B, form: RegistrationForm) -> ResultEngine<User>
where
    A: AuthProvider,
    B: BlobStore,
{
    form.validate()?;
    auth.check_new_account(&form.email, &form.password).await?;

    let path = picture_path(&form.picture.file_name);
    let photo_url = blobs.upload(&path, form.picture.bytes).await?;

    let user = match auth.create_account(&form.email, &form.password).await {
        Ok(user) => user,
        Err(err) => {
            if let Err(cleanup) = blobs.delete(&path).await {
                tracing::warn!(%path, "could not remove uploaded picture: {cleanup}");
            }
            return Err(err.into());
        }
    };
    let user = auth
        .update_profile(
            &user.id,
            ProfileUpdate {
                display_name: Some(form.name.trim().to_string()),
                photo_url: Some(photo_url),
                birthdate: form.birthdate,
                country: form.country,
            },
        )
        .await?;

    tracing::info!(user_id = %user.id, "registration completed");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            birthdate: NaiveDate::from_ymd_opt(1990, 5, 17),
            country: Some(Country::Colombia),
            picture: ProfilePicture {
                file_name: "me.png".to_string(),
                bytes: vec![1, 2, 3],
            },
            accepted_terms: true,
        }
    }

    #[test]
    fn validate_accepts_complete_form() {
        assert_eq!(valid_form().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_incomplete_forms() {
        let mut form = valid_form();
        form.confirm_password = "other".to_string();
        assert!(matches!(form.validate(), Err(ValidationError::Mismatch(_))));

        let mut form = valid_form();
        form.accepted_terms = false;
        assert_eq!(form.validate(), Err(ValidationError::MissingField("terms")));

        let mut form = valid_form();
        form.picture.bytes.clear();
        assert_eq!(form.validate(), Err(ValidationError::MissingField("picture")));

        let mut form = valid_form();
        form.country = None;
        assert_eq!(form.validate(), Err(ValidationError::MissingField("country")));
    }

    #[test]
    fn picture_path_keeps_only_the_file_name() {
        let path = picture_path("../../secret/me.png");
        assert!(path.starts_with("profile_pictures/"));
        assert!(path.ends_with("/me.png"));
        assert!(!path.contains(".."));
        assert!(picture_path("").ends_with("/picture"));
    }

    #[test]
    fn country_codes() {
        assert_eq!(Country::try_from("MX").unwrap(), Country::Mexico);
        assert_eq!(Country::try_from("argentina").unwrap(), Country::Argentina);
        assert!(Country::try_from("br").is_err());
    }
}

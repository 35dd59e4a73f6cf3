use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::provider::Credentials;

/// Body of `POST /login`.
///
/// Both fields are optional at the wire level so a missing field is reported as an
/// authentication failure instead of a deserialization error.
#[derive(Deserialize, Serialize, ToSchema, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl LoginRequest {
    /// Both fields present and non-blank; no format validation beyond presence.
    #[must_use]
    pub fn into_credentials(self) -> Option<Credentials> {
        let email = self.email.filter(|email| !email.trim().is_empty())?;
        let password = self.password.filter(|password| !password.is_empty())?;
        Some(Credentials::new(email, SecretString::from(password)))
    }
}

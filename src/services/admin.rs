use subtle::ConstantTimeEq;

use crate::config::AdminCredentials;
use crate::errors::AppError;
use crate::utils::validation::require_fields;

/// Stateless check of a username/password pair against the configured admin
/// secrets. Nothing is remembered between calls.
#[derive(Debug, Clone)]
pub struct AdminGate {
    credentials: AdminCredentials,
}

impl AdminGate {
    pub fn new(credentials: AdminCredentials) -> Self {
        Self { credentials }
    }

    /// Both fields are compared in full on every call, so the outcome does not
    /// depend on which of them was wrong.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let username_ok = username.as_bytes().ct_eq(self.credentials.username.as_bytes());
        let password_ok = password.as_bytes().ct_eq(self.credentials.password.as_bytes());
        (username_ok & password_ok).into()
    }

    /// Rejects missing or blank credentials before any comparison, then
    /// authenticates. A mismatch never says which field was wrong.
    pub fn login(&self, username: Option<&str>, password: Option<&str>) -> Result<(), AppError> {
        let missing = require_fields(
            &[("username", username), ("password", password)],
            &["username", "password"],
        );
        match (username, password) {
            (Some(username), Some(password)) if missing.is_empty() => {
                if self.authenticate(username, password) {
                    Ok(())
                } else {
                    Err(AppError::Unauthorized("Invalid credentials".to_string()))
                }
            }
            _ => Err(AppError::validation(
                "Username and password required",
                missing.iter().map(|f| f.to_string()).collect(),
            )),
        }
    }
}

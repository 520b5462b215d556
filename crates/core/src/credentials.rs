//! Bulb account details.
//!
//! The core never inspects these beyond checking that every field is
//! present; they are handed as-is to the bulb connector. `Debug` output
//! redacts the principal and secret so credentials cannot leak into logs.

use serde::Deserialize;

use crate::error::CoreError;

#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ConnectionCredentials {
    endpoint_address: String,
    principal: String,
    secret: String,
}

impl ConnectionCredentials {
    pub fn new(
        endpoint_address: impl Into<String>,
        principal: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_address: endpoint_address.into(),
            principal: principal.into(),
            secret: secret.into(),
        }
    }

    /// Host or IP address of the bulb.
    pub fn endpoint_address(&self) -> &str {
        &self.endpoint_address
    }

    /// Account name (e-mail for most vendor clouds).
    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Fail with the name of the first blank field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.endpoint_address.trim().is_empty() {
            return Err(CoreError::MissingCredential("endpoint_address"));
        }
        if self.principal.trim().is_empty() {
            return Err(CoreError::MissingCredential("principal"));
        }
        if self.secret.is_empty() {
            return Err(CoreError::MissingCredential("secret"));
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }
}

impl std::fmt::Debug for ConnectionCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCredentials")
            .field("endpoint_address", &self.endpoint_address)
            .field("principal", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

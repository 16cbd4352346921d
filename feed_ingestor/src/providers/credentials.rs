//! Basic-auth credentials for the kabu-plus CSV service.

use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;

use crate::providers::errors::{ClientInitError, MissingEnvVarSnafu};

/// Environment variable holding the kabu-plus user name.
pub const USER_ENV: &str = "KABU_PLUS_USER";
/// Environment variable holding the kabu-plus password.
pub const PASSWORD_ENV: &str = "KABU_PLUS_PASSWORD";

/// User name plus a password that never shows up in `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    user: String,
    password: SecretString,
}

impl Credentials {
    /// Build credentials from explicit values.
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        let password: String = password.into();
        Self {
            user: user.into(),
            password: SecretString::new(password.into_boxed_str()),
        }
    }

    /// Reads credentials from `KABU_PLUS_USER` and `KABU_PLUS_PASSWORD`.
    pub fn from_env() -> Result<Self, ClientInitError> {
        let user = get_env_var(USER_ENV).context(MissingEnvVarSnafu)?;
        let password = get_env_var(PASSWORD_ENV).context(MissingEnvVarSnafu)?;
        Ok(Self::new(user, password))
    }

    /// The basic-auth user name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The basic-auth password, exposed only at the call site that sends it.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

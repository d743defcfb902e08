//! Platform API integration
//!
//! Login, course discovery and curriculum retrieval against the course
//! platform. Everything downstream of login goes through [`Session`].

pub mod session;

pub use session::Session;

use crate::downloader::core::{DownloadError, Result};

/// Account credentials used for the login form
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new<U: Into<String>, P: Into<String>>(username: U, password: P) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(DownloadError::Configuration {
                message: "Username/Email is required".to_string(),
                field: Some("username".to_string()),
                suggestion: Some("Pass -u/--username or set UDEMY_USERNAME".to_string()),
            });
        }
        if self.password.is_empty() {
            return Err(DownloadError::Configuration {
                message: "Password is required".to_string(),
                field: Some("password".to_string()),
                suggestion: Some("Pass -p/--password or set UDEMY_PASSWORD".to_string()),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

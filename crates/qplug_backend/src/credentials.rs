//! Remote backend credentials
//!
//! Gantree: L3_Backend → Credentials
//!
//! Credentials come from explicit options first and fall back to the
//! `QPLUG_REMOTE_USER` / `QPLUG_REMOTE_PASSWORD` environment variables.

use std::fmt;

/// Environment variable holding the remote user name
pub const ENV_USER: &str = "QPLUG_REMOTE_USER";

/// Environment variable holding the remote password
pub const ENV_PASSWORD: &str = "QPLUG_REMOTE_PASSWORD";

/// User/password pair for the remote service
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteCredentials {
    user: String,
    password: String,
}

impl RemoteCredentials {
    /// Create credentials
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Credentials from the environment only
    pub fn from_env() -> Option<Self> {
        Self::resolve(None, None)
    }

    /// Explicit values, each falling back to its environment variable
    pub fn resolve(user: Option<&str>, password: Option<&str>) -> Option<Self> {
        let user = user
            .map(str::to_string)
            .or_else(|| std::env::var(ENV_USER).ok())?;
        let password = password
            .map(str::to_string)
            .or_else(|| std::env::var(ENV_PASSWORD).ok())?;
        if user.is_empty() {
            return None;
        }
        Some(Self::new(user, password))
    }

    /// User name
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Password
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for RemoteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_win() {
        let creds = RemoteCredentials::resolve(Some("alice"), Some("secret")).unwrap();
        assert_eq!(creds.user(), "alice");
        assert_eq!(creds.password(), "secret");
    }

    #[test]
    fn test_empty_user_rejected() {
        assert!(RemoteCredentials::resolve(Some(""), Some("secret")).is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = RemoteCredentials::new("alice", "secret");
        let text = format!("{:?}", creds);
        assert!(text.contains("alice"));
        assert!(!text.contains("secret"));
    }
}

//! Logged-in user state.
//!
//! Protected screens call [`AuthSession::require_user`]; an
//! [`RunmateError::Unauthorized`] from it (or from any API call) sends the
//! host to the login screen.

use std::sync::{Mutex, MutexGuard};

use log::{info, warn};
use thiserror::Error;

use crate::api::AuthApi;
use crate::error::{Result, RunmateError};
use crate::types::{LoginRequest, SignupRequest, SignupResponse, User};
use crate::validation::{validate_login_form, FieldErrors};

const LOGIN_REQUIRED: &str = "Login required";

#[derive(Debug)]
pub struct AuthSession<A> {
    api: A,
    user: Mutex<Option<User>>,
}

impl<A: AuthApi> AuthSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            user: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<User>> {
        self.user.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_user(&self) -> Option<User> {
        self.lock().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().is_some()
    }

    /// The logged-in user, or `Unauthorized`.
    pub fn require_user(&self) -> Result<User> {
        self.current_user().ok_or_else(|| RunmateError::Unauthorized {
            message: LOGIN_REQUIRED.to_string(),
        })
    }

    /// Check the form locally, then log in and remember the user.
    pub async fn login(&self, request: &LoginRequest) -> std::result::Result<User, LoginError> {
        let errors = validate_login_form(request);
        if !errors.is_empty() {
            return Err(LoginError::Invalid(errors));
        }

        let user = self.api.login(request).await?;
        info!("[Auth] logged in as user {}", user.user_id);
        *self.lock() = Some(user.clone());
        Ok(user)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse> {
        self.api.signup(request).await
    }

    /// Log out. The local user is cleared even when the backend call fails.
    pub async fn logout(&self) -> Result<()> {
        let result = self.api.logout().await;
        if let Err(e) = &result {
            warn!("[Auth] logout call failed, clearing local user anyway: {}", e);
        }
        *self.lock() = None;
        result
    }
}

/// Why a login attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoginError {
    /// Rejected before any request was sent
    #[error("invalid login form: {}", invalid_fields(.0))]
    Invalid(FieldErrors),
    #[error(transparent)]
    Backend(#[from] RunmateError),
}

fn invalid_fields(errors: &FieldErrors) -> String {
    errors.keys().copied().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockBackend;

    /// Backend whose logout always fails.
    struct BrokenLogout(MockBackend);

    impl AuthApi for BrokenLogout {
        async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse> {
            self.0.signup(request).await
        }

        async fn login(&self, request: &LoginRequest) -> Result<User> {
            self.0.login(request).await
        }

        async fn logout(&self) -> Result<()> {
            Err(RunmateError::http("Service Unavailable", Some(503)))
        }
    }

    fn credentials() -> LoginRequest {
        LoginRequest {
            username: "runner01".to_string(),
            password: "abcd1234".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_and_require_user() {
        let auth = AuthSession::new(MockBackend::new());
        assert!(auth.require_user().unwrap_err().is_auth_failure());

        let user = auth.login(&credentials()).await.unwrap();
        assert_eq!(auth.require_user().unwrap(), user);

        auth.logout().await.unwrap();
        assert!(!auth.is_logged_in());
    }

    #[tokio::test]
    async fn test_blank_login_is_not_sent() {
        let auth = AuthSession::new(MockBackend::new());
        let err = auth
            .login(&LoginRequest {
                username: String::new(),
                password: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LoginError::Invalid(ref e) if e.len() == 2));
    }

    #[tokio::test]
    async fn test_logout_clears_user_on_failure() {
        let auth = AuthSession::new(BrokenLogout(MockBackend::new()));
        auth.login(&credentials()).await.unwrap();

        assert!(auth.logout().await.is_err());
        assert!(auth.current_user().is_none());
    }
}

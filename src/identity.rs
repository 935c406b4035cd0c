//! Identity session access
//!
//! Wraps the opaque identity service behind the [`Identity`] trait: who is
//! the current user, sign-out, and starting an OAuth sign-in. The OAuth
//! redirect dance itself happens outside this crate; callers only observe the
//! resulting session.

use tokio::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::models::User;

/// Errors from the identity service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The session could not be read or refreshed
    #[error("Session error: {0}")]
    Session(String),

    /// The identity backend rejected or failed the request
    #[error("Identity service error: {0}")]
    Backend(String),
}

/// Supported OAuth providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    Google,
    Github,
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OAuthProvider::Google => write!(f, "google"),
            OAuthProvider::Github => write!(f, "github"),
        }
    }
}

/// Access to the opaque identity service
#[async_trait]
pub trait Identity: Send + Sync {
    /// The currently signed-in user, if any
    async fn current_user(&self) -> Result<Option<User>, IdentityError>;

    /// End the current session
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Start an OAuth sign-in with the given provider
    ///
    /// `redirect_to` is where the provider sends the browser after consent.
    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<(), IdentityError>;
}

/// In-process identity service
///
/// Holds a session user directly instead of talking to a remote provider.
/// `sign_in_with_oauth` installs the configured user, standing in for a
/// completed OAuth round trip.
pub struct MemoryIdentity {
    account: Option<User>,
    session: Mutex<Option<User>>,
}

impl MemoryIdentity {
    /// An identity service with no account; sign-in always yields no user
    pub fn anonymous() -> Self {
        Self {
            account: None,
            session: Mutex::new(None),
        }
    }

    /// An identity service for `user`, not yet signed in
    pub fn for_account(user: User) -> Self {
        Self {
            account: Some(user),
            session: Mutex::new(None),
        }
    }

    /// An identity service with `user` already signed in
    pub fn signed_in(user: User) -> Self {
        Self {
            account: Some(user.clone()),
            session: Mutex::new(Some(user)),
        }
    }
}

#[async_trait]
impl Identity for MemoryIdentity {
    async fn current_user(&self) -> Result<Option<User>, IdentityError> {
        Ok(self.session.lock().await.clone())
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        debug!("signing out");
        *self.session.lock().await = None;
        Ok(())
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<(), IdentityError> {
        debug!(%provider, redirect_to, "starting oauth sign-in");
        let user = self
            .account
            .clone()
            .ok_or_else(|| IdentityError::Backend("no account for this provider".to_string()))?;
        *self.session.lock().await = Some(user);
        Ok(())
    }
}

//! Identity collaborator.
//!
//! The uploader only needs to know who is signed in and which namespace their
//! objects live under. The namespace is the domain part of the principal's
//! email, so everyone from one organisation shares a prefix.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("No user is signed in")]
    SignedOut,

    #[error("Email address has no usable domain: {0}")]
    InvalidEmail(String),

    #[error("Identity provider error: {0}")]
    Provider(String),
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub email: String,
}

impl Principal {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    /// Namespace derived from the email domain (the part after `@`).
    pub fn namespace(&self) -> Result<String, IdentityError> {
        namespace_from_email(&self.email)
    }
}

/// Domain part of an email address, used as the object-key namespace.
///
/// Takes the text between the first `@` and the next one, if any.
pub fn namespace_from_email(email: &str) -> Result<String, IdentityError> {
    let domain = email
        .split('@')
        .nth(1)
        .map(str::trim)
        .unwrap_or_default();

    if domain.is_empty() || domain.contains('/') || domain == ".." {
        return Err(IdentityError::InvalidEmail(email.to_string()));
    }

    Ok(domain.to_string())
}

/// Identity collaborator interface
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently authenticated principal.
    async fn current_principal(&self) -> Result<Principal, IdentityError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}

/// Resolve the caller's namespace through the identity collaborator.
pub async fn resolve_namespace(identity: &dyn IdentityProvider) -> Result<String, IdentityError> {
    identity.current_principal().await?.namespace()
}

/// Identity fixed at start-up, e.g. from configuration.
pub struct StaticIdentity {
    principal: RwLock<Option<Principal>>,
}

impl StaticIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            principal: RwLock::new(Some(Principal::new(email))),
        }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_principal(&self) -> Result<Principal, IdentityError> {
        let guard = self
            .principal
            .read()
            .map_err(|_| IdentityError::Provider("identity lock poisoned".to_string()))?;
        guard.clone().ok_or(IdentityError::SignedOut)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        let mut guard = self
            .principal
            .write()
            .map_err(|_| IdentityError::Provider("identity lock poisoned".to_string()))?;
        if let Some(principal) = guard.take() {
            tracing::info!(email = %principal.email, "Signed out");
        }
        Ok(())
    }
}

impl From<IdentityError> for bucketdrop_core::AppError {
    fn from(err: IdentityError) -> Self {
        bucketdrop_core::AppError::Identity(err.to_string())
    }
}

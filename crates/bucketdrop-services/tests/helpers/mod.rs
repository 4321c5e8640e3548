#![allow(dead_code)]

pub mod fixtures;
pub mod storage;

use std::sync::Arc;

use async_trait::async_trait;
use bucketdrop_services::{IdentityError, IdentityProvider, Principal, StaticIdentity};

pub const TEST_EMAIL: &str = "jane@example.com";
pub const TEST_NAMESPACE: &str = "example.com";

pub fn signed_in() -> Arc<dyn IdentityProvider> {
    Arc::new(StaticIdentity::new(TEST_EMAIL))
}

/// Identity collaborator with nobody signed in.
pub struct SignedOutIdentity;

#[async_trait]
impl IdentityProvider for SignedOutIdentity {
    async fn current_principal(&self) -> Result<Principal, IdentityError> {
        Err(IdentityError::SignedOut)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

//! Principal lookup and secret comparison seams used by the auth core.

use std::future::Future;

use crate::db::{Database, Principal};

/// Source of principals. The auth core reads principals and writes exactly one field:
/// the currently valid refresh token.
pub trait UserDirectory: Send + Sync {
    fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> impl Future<Output = Result<Option<Principal>, sqlx::Error>> + Send;

    fn find_by_refresh_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Principal>, sqlx::Error>> + Send;

    /// Overwrite the stored refresh token; `None` revokes it.
    fn store_refresh_token(
        &self,
        identifier: &str,
        token: Option<&str>,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
}

impl UserDirectory for Database {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Principal>, sqlx::Error> {
        self.users().get_by_email(identifier).await
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<Option<Principal>, sqlx::Error> {
        self.users().get_by_refresh_token(token).await
    }

    async fn store_refresh_token(
        &self,
        identifier: &str,
        token: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        self.users().set_refresh_token(identifier, token).await?;
        Ok(())
    }
}

/// One-way comparison of a presented secret against a stored hash.
pub trait SecretComparator: Send + Sync {
    fn matches(&self, secret: &str, hash: &str) -> bool;
}

/// bcrypt comparator. Unparseable hashes never match.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptComparator;

impl BcryptComparator {
    /// Hash a secret for storage.
    pub fn hash(secret: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(secret, bcrypt::DEFAULT_COST)
    }
}

impl SecretComparator for BcryptComparator {
    fn matches(&self, secret: &str, hash: &str) -> bool {
        match bcrypt::verify(secret, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored secret hash could not be verified");
                false
            }
        }
    }
}

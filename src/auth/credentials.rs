//! Identifier/secret validation, independent of tokens.

use std::sync::Arc;

use crate::db::Principal;

use super::directory::{SecretComparator, UserDirectory};
use super::errors::{AuthError, AuthErrorKind};

/// Validate an {identifier, secret} pair.
///
/// A disabled account is rejected before the secret is compared, so the response for a
/// disabled account does not depend on whether the secret was right. The comparison runs
/// on the blocking pool since bcrypt takes hundreds of milliseconds.
pub async fn authenticate<D: UserDirectory>(
    directory: &D,
    comparator: Arc<dyn SecretComparator>,
    identifier: &str,
    secret: &str,
) -> Result<Principal, AuthError> {
    let principal = directory
        .find_by_identifier(identifier)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to look up principal");
            AuthError::new(AuthErrorKind::Internal)
        })?
        .ok_or(AuthErrorKind::UnknownPrincipal)?;

    if !principal.active {
        return Err(AuthErrorKind::DisabledAccount.into());
    }

    let secret = secret.to_owned();
    let hash = principal.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || comparator.matches(&secret, &hash))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Secret comparison task failed");
            AuthError::new(AuthErrorKind::Internal)
        })?;

    if !matches {
        return Err(AuthErrorKind::BadSecret.into());
    }

    Ok(principal)
}

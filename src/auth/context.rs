//! Request-scoped authentication state.
//!
//! A `RequestContext` lives in the request's extensions. It is created empty when the
//! request enters the pipeline and dropped with the request; nothing in it is shared
//! across requests.

use std::collections::BTreeSet;

use crate::db::{Principal, Role};

use super::errors::AuthError;

/// Who is making this call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    pub identifier: String,
    pub roles: BTreeSet<Role>,
}

impl SecurityContext {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl From<&Principal> for SecurityContext {
    fn from(principal: &Principal) -> Self {
        Self {
            identifier: principal.email.clone(),
            roles: principal.roles.clone(),
        }
    }
}

/// Result of the token filter for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    ContextSet(SecurityContext),
    ContextEmpty,
}

/// Security context plus the first auth failure detected upstream.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    security: Option<SecurityContext>,
    failure: Option<AuthError>,
}

impl RequestContext {
    pub fn security(&self) -> Option<&SecurityContext> {
        self.security.as_ref()
    }

    pub fn failure(&self) -> Option<&AuthError> {
        self.failure.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.security.is_some()
    }

    /// Populate the security context. Only the first call has an effect.
    pub fn authenticate(&mut self, security: SecurityContext) -> bool {
        if self.security.is_some() {
            return false;
        }
        self.security = Some(security);
        true
    }

    /// Attach a failure marker. The first detected failure wins.
    pub fn attach_failure(&mut self, failure: AuthError) -> bool {
        if self.failure.is_some() {
            return false;
        }
        self.failure = Some(failure);
        true
    }

    pub fn outcome(&self) -> AuthOutcome {
        match &self.security {
            Some(security) => AuthOutcome::ContextSet(security.clone()),
            None => AuthOutcome::ContextEmpty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::errors::AuthErrorKind;

    fn security(identifier: &str) -> SecurityContext {
        SecurityContext {
            identifier: identifier.to_string(),
            roles: BTreeSet::from([Role::User]),
        }
    }

    #[test]
    fn test_starts_empty() {
        let ctx = RequestContext::default();
        assert!(!ctx.is_authenticated());
        assert!(ctx.failure().is_none());
        assert_eq!(ctx.outcome(), AuthOutcome::ContextEmpty);
    }

    #[test]
    fn test_first_failure_wins() {
        let mut ctx = RequestContext::default();

        assert!(ctx.attach_failure(AuthError::new(AuthErrorKind::ExpiredToken)));
        assert!(!ctx.attach_failure(AuthError::new(AuthErrorKind::UnknownPrincipal)));

        assert_eq!(ctx.failure().unwrap().kind, AuthErrorKind::ExpiredToken);
    }

    #[test]
    fn test_security_context_set_once() {
        let mut ctx = RequestContext::default();

        assert!(ctx.authenticate(security("alice@example.com")));
        assert!(!ctx.authenticate(security("mallory@example.com")));

        assert_eq!(
            ctx.outcome(),
            AuthOutcome::ContextSet(security("alice@example.com"))
        );
    }
}

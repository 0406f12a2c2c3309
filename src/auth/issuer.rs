//! Token minting after a successful login or refresh.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::db::Principal;
use crate::jwt::{IssuedToken, TokenCodec, TokenKind};

use super::directory::UserDirectory;
use super::errors::{AuthError, AuthErrorKind};
use super::headers::{ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER, bearer_value};
use super::state::TokenTtls;

/// Tokens handed out by a successful login.
#[derive(Debug, Clone)]
pub struct LoginTokens {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// A new access token handed out by a successful refresh.
#[derive(Debug, Clone)]
pub struct AccessTokenGrant {
    pub access: IssuedToken,
}

pub struct TokenIssuer<'a, D> {
    directory: &'a D,
    codec: &'a TokenCodec,
    ttls: TokenTtls,
}

impl<'a, D: UserDirectory> TokenIssuer<'a, D> {
    pub fn new(directory: &'a D, codec: &'a TokenCodec, ttls: TokenTtls) -> Self {
        Self {
            directory,
            codec,
            ttls,
        }
    }

    /// Mint an access and a refresh token and make the refresh token the principal's only
    /// valid one.
    pub async fn issue_login_tokens(&self, principal: &Principal) -> Result<LoginTokens, AuthError> {
        let access = self.mint(TokenKind::Access, principal)?;
        let refresh = self.mint(TokenKind::Refresh, principal)?;

        self.directory
            .store_refresh_token(&principal.email, Some(&refresh.token))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to store refresh token");
                AuthError::new(AuthErrorKind::Internal)
            })?;

        tracing::debug!(subject = %principal.email, "Issued login tokens");
        Ok(LoginTokens { access, refresh })
    }

    /// Mint a new access token only.
    pub fn reissue_access_token(&self, principal: &Principal) -> Result<AccessTokenGrant, AuthError> {
        let access = self.mint(TokenKind::Access, principal)?;
        tracing::debug!(subject = %principal.email, "Reissued access token");
        Ok(AccessTokenGrant { access })
    }

    fn mint(&self, kind: TokenKind, principal: &Principal) -> Result<IssuedToken, AuthError> {
        let ttl = match kind {
            TokenKind::Access => self.ttls.access,
            TokenKind::Refresh => self.ttls.refresh,
        };
        self.codec.issue(kind, &principal.email, ttl).map_err(|e| {
            tracing::error!(error = %e, kind = kind.as_str(), "Failed to generate token");
            AuthError::new(AuthErrorKind::Internal)
        })
    }
}

fn token_response(tokens: &[(axum::http::HeaderName, &str)]) -> Response {
    let mut response = StatusCode::OK.into_response();
    for (name, token) in tokens {
        match bearer_value(token) {
            Some(value) => {
                response.headers_mut().insert(name.clone(), value);
            }
            None => return AuthError::new(AuthErrorKind::Internal).into_response(),
        }
    }
    response
}

impl IntoResponse for LoginTokens {
    fn into_response(self) -> Response {
        token_response(&[
            (ACCESS_TOKEN_HEADER, self.access.token.as_str()),
            (REFRESH_TOKEN_HEADER, self.refresh.token.as_str()),
        ])
    }
}

impl IntoResponse for AccessTokenGrant {
    fn into_response(self) -> Response {
        token_response(&[(ACCESS_TOKEN_HEADER, self.access.token.as_str())])
    }
}

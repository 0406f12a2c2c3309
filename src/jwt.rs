//! Signed token creation and validation.
//!
//! Tokens are HS256 JWTs. Access tokens are short-lived and stateless; refresh tokens are
//! long-lived and only honoured while the directory still holds their exact value.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default access token lifetime: 30 minutes.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Default refresh token lifetime: 2 weeks.
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Token kind, carried in the `tokenKind` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived token presented on every API call
    Access,
    /// Long-lived token used only against the refresh endpoint
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// Claim set of every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Principal identifier (email)
    pub subject: String,
    #[serde(rename = "tokenKind")]
    pub kind: TokenKind,
    /// Random token ID so two tokens minted in the same second never collide
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// A freshly minted token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Why a raw token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Not three segments, undecodable header or claims, missing claims, wrong kind
    Malformed,
    /// Signature does not match the signing key
    InvalidSignature,
    /// `exp` is in the past
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::Expired => write!(f, "Token has expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Failure to encode a claim set.
#[derive(Debug)]
pub struct IssueError(jsonwebtoken::errors::Error);

impl std::fmt::Display for IssueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to encode token: {}", self.0)
    }
}

impl std::error::Error for IssueError {}

/// Signs and verifies tokens with a symmetric key loaded once at startup.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Mint a token of the given kind for `subject`, valid for `ttl` from now.
    pub fn issue(
        &self,
        kind: TokenKind,
        subject: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, IssueError> {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = Claims {
            subject: subject.to_string(),
            kind,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now.saturating_add(ttl.as_secs()),
        };

        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Sign an arbitrary claim set.
    pub fn sign(&self, claims: &Claims) -> Result<String, IssueError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(IssueError)
    }

    /// Verify the signature, then the claim structure, then expiry.
    pub fn parse(&self, raw: &str) -> Result<Claims, TokenError> {
        if raw.split('.').count() != 3 {
            return Err(TokenError::Malformed);
        }

        jsonwebtoken::decode::<Claims>(raw, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| classify(raw, e.kind()))
    }

    /// Parse and require a specific token kind.
    pub fn parse_kind(&self, raw: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.parse(raw)?;
        if claims.kind != kind {
            return Err(TokenError::Malformed);
        }
        Ok(claims)
    }
}

fn classify(raw: &str, kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingAlgorithm => TokenError::InvalidSignature,
        // The header is decoded before the signature and the claims only after it, so a
        // base64 failure with intact header and claims segments is the signature's.
        ErrorKind::Base64(_) if signed_segments_decode(raw) => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    }
}

fn signed_segments_decode(raw: &str) -> bool {
    raw.split('.')
        .take(2)
        .all(|segment| URL_SAFE_NO_PAD.decode(segment).is_ok())
}

//! Stateless token authentication and path-based authorization.
//!
//! Every request runs through three middleware stages, in order:
//! 1. `login_filter` answers `POST /login` with a fresh access/refresh token pair.
//! 2. `request_auth_filter` answers `POST /refresh` with a new access token, and
//!    everywhere else turns a bearer access token into a request-scoped security context.
//! 3. `authorization_gate` lets public paths through, and otherwise requires a security
//!    context (and a role for admin paths), rejecting through the entry point.

mod context;
mod credentials;
mod directory;
mod entry_point;
mod errors;
mod extractors;
mod filter;
mod gate;
mod headers;
mod issuer;
mod login;
mod state;

pub use context::{AuthOutcome, RequestContext, SecurityContext};
pub use credentials::authenticate;
pub use directory::{BcryptComparator, SecretComparator, UserDirectory};
pub use entry_point::commence;
pub use errors::{AuthError, AuthErrorKind, ErrorEnvelope};
pub use extractors::Authenticated;
pub use filter::{REFRESH_PATH, authenticate_access, authenticate_refresh, request_auth_filter};
pub use gate::{Access, authorization_gate, required_access};
pub use headers::{ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER, access_token, refresh_token};
pub use issuer::{AccessTokenGrant, LoginTokens, TokenIssuer};
pub use login::{LOGIN_PATH, login_filter};
pub use state::{AuthState, TokenTtls};

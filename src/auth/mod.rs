//! Authentication, authorization and the session cache

pub mod authenticator;
pub mod hash;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod roles;
pub mod session;

pub use authenticator::Authenticator;
pub use hash::PasswordHasher;
pub use jwt::{Claims, TokenKind, TokenService};
pub use middleware::{extract_bearer_token, CurrentUser};
pub use models::{Role, User};
pub use roles::RoleGate;
pub use session::{SessionCache, USER_CACHE_TTL_SECS};

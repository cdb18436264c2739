mod extract;
mod password;
mod policy;
mod session;

pub use extract::{
    AuthError, RequireAuth, SESSION_COOKIE, clear_session_cookie, session_cookie,
    session_token_from_cookie_header,
};
pub use password::CredentialHasher;
pub use policy::{require_ownership, require_role};
pub use session::{Session, SessionStore, SweeperHandle};

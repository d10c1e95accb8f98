//! Staff login and the per-login session context.
//!
//! A session carries the signed-in staff member and the open cart. It is an
//! explicit value owned by a [`SessionStore`]; handlers receive the resolved
//! [`StaffUser`] through a request extension installed by
//! [`router::resolve_session`].

pub mod domain;
pub mod router;
pub mod service;
pub mod store;

pub use domain::{Cart, Role, SessionContext, SessionToken, StaffAccount, StaffUser};
pub use router::{require_admin, require_staff, resolve_session, session_router};
pub use service::{SessionError, SessionService, StaffDirectory};
pub use store::{InMemorySessionStore, SessionStore, StoreError};

//! Session ownership and page-level authorization.
//! Keep the public surface thin and split implementation across sub-modules.

mod session;
mod gate;

pub use session::{FileSessionStore, MemorySessionStore, SessionError, SessionProvider, SessionStore, SessionToken};
pub use gate::{role_allowed, role_check, AuthGate, GateOptions, GateOutcome, GateState};

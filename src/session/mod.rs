//! Browser session management
//!
//! This module guards the single shared browser session: single-flight
//! initialization with exponential backoff, and retrying of the work that
//! runs against it.

pub mod guard;
pub mod payload;
pub mod policy;

pub use guard::{SessionGuard, SessionState};
pub use payload::EmptyCheck;
pub use policy::RetryPolicy;

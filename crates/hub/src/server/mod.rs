//! Server module — transport sessions and the accept loop.

pub mod listener;
pub mod session;

pub use session::{Session, SessionRegistry};

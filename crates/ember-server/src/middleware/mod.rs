//! Request middleware.

mod session;

pub use session::{SessionContext, session_middleware};

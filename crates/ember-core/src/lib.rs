//! ember-core - Core library for Ember
//!
//! This crate provides the focus-session workflow shared by the Ember server:
//!
//! - **focus**: Workflow engine (questions, answers, activities, check-ins)
//! - **store**: Session stores with TTL and capacity eviction
//! - **db**: SQLite-backed session store (`db` feature)
//! - **generator**: Suggestion generation boundary, canned and OpenAI-backed
//! - **rating**: Latest wheel ratings per session

#[cfg(feature = "db")]
pub mod db;
pub mod error;
pub mod focus;
pub mod generator;
pub mod rating;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use focus::FocusEngine;
pub use store::{InMemorySessionStore, SessionStore, StoreConfig};

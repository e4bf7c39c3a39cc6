//! Focus-session workflow engine.
//!
//! A focus session walks the user through three fixed questions about one
//! category, then hands the answers to the suggestion generator and records
//! which activities the user picked. A weekly check-in later reopens or
//! closes the session.
//!
//! ## Lifecycle
//!
//! ```text
//! create ──► Active ──answer×3──► (suggestions) ──select──► Completed
//!              ▲                                              │
//!              └──────────── check-in (continue) ◄────────────┘
//!                            check-in (stop) ──► Completed
//! ```
//!
//! Only activity selection and check-ins change status; answering questions
//! never does.

mod engine;
mod locks;
mod questions;

pub use engine::*;
pub use locks::KeyLocks;
pub use questions::*;

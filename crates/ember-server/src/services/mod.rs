//! Background services.

pub mod eviction;

pub use eviction::spawn_eviction_task;

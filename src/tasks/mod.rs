//! Background Tasks Module
//!
//! # Tasks
//! - Cache cleanup: drops expired cached documents at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;

//! Ear Training API - backend for a pitch ear-training app
//!
//! Stores users and exercise attempts in Cloud Firestore (or memory), with a
//! TTL/LRU read-through cache in front of the store.

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod retry;
pub mod store;
pub mod tasks;
pub mod training;

pub use api::AppState;
pub use config::Config;
pub use error::{AppError, Result};
pub use tasks::spawn_cleanup_task;

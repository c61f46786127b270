//! API Module
//!
//! HTTP handlers and routing.
//!
//! # Endpoints
//! - `GET /` - Service banner
//! - `GET /health` - Health check
//! - `GET /stats` - Document cache statistics
//! - `GET|PUT|DELETE /documents/*path` - Generic document access
//! - `GET /exercises/pitch` - New pitch exercise
//! - `POST|GET /users/:user_id/attempts` - Submit an attempt, list history
//! - `GET /users/:user_id/{profile,progress,streak,accuracy}` - Summaries

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

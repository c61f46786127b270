//! Request and Response models for the HTTP API
//!
//! DTOs used for serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{ExerciseParams, HistoryParams, PutDocumentRequest, SubmitAttemptRequest};
pub use responses::{
    DeleteResponse, DocumentResponse, ErrorResponse, HealthResponse, HistoryResponse,
    RootResponse, StatsResponse,
};

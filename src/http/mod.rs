//! HTTP API for the transcription service
//!
//! - POST /transcriptions - Submit audio for transcription
//! - GET /transcriptions/:id - Fetch a record (cache-first)
//! - GET /health - Health check
//! - /artifacts/* - Stored raw audio, served statically

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

pub mod db {
    pub mod documents;
    pub mod schema_init;
}
pub mod api;
pub mod auth;
pub mod chunker;
pub mod config;
pub mod errors;
pub mod extract;
pub mod monitoring;
pub mod multipart;
pub mod upstream;
pub mod validation;

pub use chunker::{chunk_text, Chunk, Chunker};
pub use errors::{ApiError, ApiResult};
pub use monitoring::trace_middleware;

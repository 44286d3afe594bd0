//! HTTP API handlers

pub mod download;
pub mod health;
pub mod jobs;
pub mod results;
pub mod sse;
pub mod status;
pub mod upload;

pub use download::download_routes;
pub use health::health_routes;
pub use jobs::job_routes;
pub use results::result_routes;
pub use sse::event_stream;
pub use status::status_routes;
pub use upload::upload_routes;

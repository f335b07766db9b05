pub mod client;
pub mod models;
pub mod response;
pub mod streaming;

pub use client::make_api_request;
pub use models::{ApiMessage, RequestBody};
pub use streaming::{content_deltas, response_deltas};

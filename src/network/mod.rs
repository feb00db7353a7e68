//! Network API surface.
//!
//! - [`api`] - Route handling for `/networks`, `/connect`, `/status`, `/log`
//! - [`server`] - `tiny_http` server running the routes on a background thread

mod api;
mod server;

pub use api::{handle_request, ApiError, ApiResponse};
pub use server::ApiServer;

mod error;
mod handler;
mod router;

pub use error::*;
pub use handler::{ApiResponse, AuthQuery, RefreshRequest};
pub use router::routes;

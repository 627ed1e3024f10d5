pub mod error;
pub mod job_handlers;
pub mod market_handlers;
pub mod openapi;
pub mod responses;
pub mod routes;

pub use error::ApiError;
pub use openapi::ApiDoc;
pub use responses::*;
pub use routes::{create_router, AppState};

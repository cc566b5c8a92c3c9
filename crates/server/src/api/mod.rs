pub mod campaigns;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ratio_fixer;
pub mod routes;

pub use error::ApiError;
pub use routes::create_router;

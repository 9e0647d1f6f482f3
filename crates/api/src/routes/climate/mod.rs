pub mod climate_routes;
pub mod error;

pub use climate_routes::*;
pub use error::ErrorBody;

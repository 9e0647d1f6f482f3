pub mod db;
pub mod routes;
pub mod startup;
pub mod templates;
pub mod utils;
pub mod window;

pub use db::*;
pub use routes::*;
pub use startup::*;
pub use utils::*;
pub use window::*;

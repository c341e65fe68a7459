// HTTP routes
pub mod api;
pub mod error;
pub mod health;

pub use api::*;
pub use error::*;
pub use health::*;

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod validation;
pub mod voices;

pub use api::*;
pub use config::*;
pub use errors::*;
pub use models::*;
pub use services::*;
pub use validation::*;
pub use voices::*;

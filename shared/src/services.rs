pub mod identity_provider;
pub mod profile_store;
pub mod cognito_service;
pub mod dynamodb_service;
pub mod memory;
pub mod registration_service;
pub mod profile_service;

pub use identity_provider::*;
pub use profile_store::*;
pub use cognito_service::*;
pub use dynamodb_service::*;
pub use memory::*;
pub use registration_service::*;
pub use profile_service::*;

pub mod factory;
pub mod password;
pub mod policy;
pub mod principal;
pub mod service;
pub mod stats;
pub mod token_codec;

pub use factory::build_auth_service;
pub use service::AuthService;

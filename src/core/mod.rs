pub mod errors;
pub mod export;
pub mod models;
pub mod services;
pub mod session;
pub mod signature;
pub mod traits;
pub mod validation;

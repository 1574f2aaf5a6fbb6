pub mod assistant;
pub mod error;
pub mod metrics;
pub mod password;
pub mod services;
pub mod tokens;
pub mod traits;

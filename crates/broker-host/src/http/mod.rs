pub mod error;
pub mod health;
pub mod simple;

pub use error::ApiError;

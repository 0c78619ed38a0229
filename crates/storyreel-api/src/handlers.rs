//! API handlers.

pub mod auth;
pub mod generate;
pub mod health;
pub mod video;

pub use health::health;

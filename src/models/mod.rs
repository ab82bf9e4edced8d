//! Data models

pub mod user;
pub mod prediction_log;

pub use user::*;
pub use prediction_log::*;

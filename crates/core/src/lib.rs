#![forbid(unsafe_code)]

pub mod analytics;
pub mod classify;
pub mod error;
pub mod health;
pub mod model;
pub mod reconcile;
pub mod time;
pub mod window;

pub use error::Error;
pub use time::Clock;

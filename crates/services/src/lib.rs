#![forbid(unsafe_code)]

pub mod app_services;
pub mod entry_service;
pub mod error;
pub mod progress_service;

pub use hifz_core::Clock;

pub use app_services::HifzServices;
pub use entry_service::EntryService;
pub use error::{EntryError, ProgressError, ServicesInitError};
pub use progress_service::{ProgressService, StageOverview, StudentOverview};

#![forbid(unsafe_code)]

pub mod admin_service;
pub mod app_services;
pub mod error;
pub mod profile_service;
pub mod selection;
mod snapshot;
pub mod tracker_service;

pub use tracker_core::Clock;

pub use admin_service::AdminService;
pub use app_services::AppServices;
pub use error::{AdminServiceError, AppServicesError, ProfileServiceError, TrackerServiceError};
pub use profile_service::ProfileService;
pub use selection::{Selection, SelectionTicket, SelectionTracker};
pub use tracker_service::{DayView, MonthView, ToggleOutcome, TrackerService};

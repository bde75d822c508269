//! `wardbook` - Records for a staff clinic
//!
//! This library provides staff registration, dependants, visit logging,
//! search, dashboard statistics and CSV export over a `SQLite` store, plus the
//! web front end that serves them.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod records;
pub mod storage;
pub mod upload;
pub mod web;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use records::{
    Dependant, DependantAdded, NewDependant, NewStaff, NewVisit, Outcome, Staff, StaffDetail,
    StaffKey, StaffSummary, Visit, MAX_DEPENDANTS,
};
pub use storage::{Statistics, Storage};
pub use upload::UploadStore;

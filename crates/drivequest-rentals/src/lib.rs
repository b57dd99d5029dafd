//! DriveQuest rentals core
//!
//! Customer, fleet, reservation, rental, payment and maintenance stores with
//! reservation overlap checks, invoice calculation, snapshot persistence and
//! periodic reminder jobs.

pub mod config;
pub mod domain;
pub mod error;
pub mod scheduler;
pub mod services;
pub mod storage;

pub use config::RentalsConfig;
pub use error::{RentalError, Result};
pub use services::{Services, Summary};

//! Configuration for the DriveQuest rentals service
//!
//! Loaded through [`ConfigLoader`]: defaults, then `drivequest.toml`, then
//! `DRIVEQUEST_*` environment variables (`DRIVEQUEST_SCHEDULER__ENABLED=false`).

use crate::domain::BillingPolicy;
use drivequest_common::{ConfigLoader, ConfigurationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalsConfig {
    pub storage: StorageConfig,
    pub billing: BillingConfig,
    pub scheduler: SchedulerConfig,
}

impl ConfigLoader for RentalsConfig {
    const DEFAULT_FILE: &'static str = "drivequest.toml";
    const ENV_PREFIX: &'static str = "DRIVEQUEST_";
}

impl RentalsConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.storage.validate()?;
        self.billing.validate()?;
        self.scheduler.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the per-entity snapshot files.
    pub data_dir: PathBuf,
    /// Directory receiving one contract file per rental.
    pub contracts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            contracts_dir: PathBuf::from("contracts"),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(invalid("storage.data_dir", "cannot be empty"));
        }
        if self.contracts_dir.as_os_str().is_empty() {
            return Err(invalid("storage.contracts_dir", "cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    pub tax_rate: Decimal,
    pub cargo_discount: Decimal,
    pub passenger_discount: Decimal,
}

impl Default for BillingConfig {
    fn default() -> Self {
        let policy = BillingPolicy::default();
        Self {
            tax_rate: policy.tax_rate,
            cargo_discount: policy.cargo_discount,
            passenger_discount: policy.passenger_discount,
        }
    }
}

impl BillingConfig {
    pub fn policy(&self) -> BillingPolicy {
        BillingPolicy {
            tax_rate: self.tax_rate,
            cargo_discount: self.cargo_discount,
            passenger_discount: self.passenger_discount,
        }
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, rate) in [
            ("billing.tax_rate", self.tax_rate),
            ("billing.cargo_discount", self.cargo_discount),
            ("billing.passenger_discount", self.passenger_discount),
        ] {
            if rate < Decimal::ZERO || rate >= Decimal::ONE {
                return Err(invalid(field, format!("{rate} must be in [0, 1)")));
            }
        }
        Ok(())
    }
}

/// Upper bound for `scheduler.ending_window_days`.
pub const MAX_ENDING_WINDOW_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub reservation_check_secs: u64,
    pub fleet_check_secs: u64,
    /// Reservations ending within this many days trigger a reminder.
    pub ending_window_days: u32,
    pub shutdown_grace_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reservation_check_secs: 60,
            fleet_check_secs: 10,
            ending_window_days: 3,
            shutdown_grace_secs: 5,
        }
    }
}

impl SchedulerConfig {
    pub fn reservation_check_interval(&self) -> Duration {
        Duration::from_secs(self.reservation_check_secs)
    }

    pub fn fleet_check_interval(&self) -> Duration {
        Duration::from_secs(self.fleet_check_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.reservation_check_secs == 0 {
            return Err(invalid("scheduler.reservation_check_secs", "must be positive"));
        }
        if self.fleet_check_secs == 0 {
            return Err(invalid("scheduler.fleet_check_secs", "must be positive"));
        }
        if self.ending_window_days == 0 {
            return Err(invalid("scheduler.ending_window_days", "must be positive"));
        }
        if self.ending_window_days > MAX_ENDING_WINDOW_DAYS {
            return Err(invalid(
                "scheduler.ending_window_days",
                format!("must be at most {MAX_ENDING_WINDOW_DAYS}"),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

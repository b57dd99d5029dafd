use crate::domain::billing::{BillingPolicy, Invoice};
use crate::domain::customers::Customer;
use crate::domain::fleet::{FleetManager, FleetOperations, Vehicle};
use crate::domain::types::{require_non_negative_f64, require_text, today, Money};
use crate::error::{Entity, RentalError, Result};
use crate::storage::contracts::ContractWriter;
use chrono::NaiveDate;
use drivequest_common::ids;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    #[default]
    Basic,
    Premium,
    Corporate,
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractType::Basic => write!(f, "Basic"),
            ContractType::Premium => write!(f, "Premium"),
            ContractType::Corporate => write!(f, "Corporate"),
        }
    }
}

impl FromStr for ContractType {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(ContractType::Basic),
            "premium" => Ok(ContractType::Premium),
            "corporate" => Ok(ContractType::Corporate),
            other => Err(RentalError::invalid(
                "contract type",
                format!("unknown contract type '{other}'"),
            )),
        }
    }
}

/// A recorded vehicle lease with fixed dates and computed total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: String,
    pub customer: Customer,
    pub vehicle: Vehicle,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mileage: f64,
    pub total_amount: Money,
    #[serde(default)]
    pub contract_type: ContractType,
}

impl Rental {
    pub fn validate(&self) -> Result<()> {
        require_text("rental id", &self.id)?;
        validate_dates(self.start, self.end)?;
        require_non_negative_f64("mileage", self.mileage)?;
        if self.total_amount.is_negative() {
            return Err(RentalError::invalid("total amount", "must not be negative"));
        }
        Ok(())
    }

    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Days times the vehicle's daily price, charging at least one day.
    pub fn base_amount(&self) -> Money {
        self.vehicle
            .daily_price
            .multiply(Decimal::from(self.duration_days().max(1)))
    }

    /// Whether `date` falls within the rental, both ends inclusive.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for Rental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} -> {} | ${} | {}",
            self.id,
            self.customer.full_name,
            self.vehicle.plate,
            self.start,
            self.end,
            self.total_amount,
            self.contract_type
        )
    }
}

fn validate_dates(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end <= start {
        return Err(RentalError::date_range(start, end));
    }
    Ok(())
}

/// Input for [`RentalManager::register_rental`].
#[derive(Debug, Clone)]
pub struct RentalRequest {
    pub customer: Customer,
    pub plate: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mileage: f64,
    /// Defaults to the vehicle's daily price.
    pub daily_rate: Option<Money>,
    pub apply_discount: bool,
    pub contract_type: ContractType,
}

impl RentalRequest {
    pub fn new(customer: Customer, plate: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            customer,
            plate: plate.into(),
            start,
            end,
            mileage: 0.0,
            daily_rate: None,
            apply_discount: false,
            contract_type: ContractType::default(),
        }
    }

    pub fn with_mileage(mut self, mileage: f64) -> Self {
        self.mileage = mileage;
        self
    }

    pub fn with_daily_rate(mut self, rate: Money) -> Self {
        self.daily_rate = Some(rate);
        self
    }

    pub fn with_discount(mut self, apply: bool) -> Self {
        self.apply_discount = apply;
        self
    }

    pub fn with_contract_type(mut self, contract_type: ContractType) -> Self {
        self.contract_type = contract_type;
        self
    }
}

/// A successfully recorded rental and the invoice it was billed with.
#[derive(Debug, Clone)]
pub struct RentalReceipt {
    pub rental: Rental,
    pub invoice: Invoice,
}

/// Rental history operations
pub trait RentalOperations: Send + Sync {
    fn register_rental(&self, request: RentalRequest) -> Result<RentalReceipt>;
    fn find(&self, id: &str) -> Option<Rental>;
    fn history(&self) -> Vec<Rental>;
    fn for_customer(&self, national_id: &str) -> Vec<Rental>;
    fn find_active_rental_on(&self, national_id: &str, date: NaiveDate) -> Option<Rental>;

    fn find_active_rental_for_customer(&self, national_id: &str) -> Option<Rental> {
        self.find_active_rental_on(national_id, today())
    }
}

pub struct RentalManager {
    rentals: RwLock<Vec<Rental>>,
    fleet: Arc<FleetManager>,
    policy: BillingPolicy,
    contracts: ContractWriter,
}

impl RentalManager {
    pub fn new(fleet: Arc<FleetManager>, policy: BillingPolicy, contracts: ContractWriter) -> Self {
        Self {
            rentals: RwLock::new(Vec::new()),
            fleet,
            policy,
            contracts,
        }
    }

    pub fn policy(&self) -> &BillingPolicy {
        &self.policy
    }

    pub fn restore(&self, rentals: Vec<Rental>) -> Result<()> {
        Self::check_restore(&rentals)?;
        self.replace_all(rentals);
        Ok(())
    }

    pub fn check_restore(rentals: &[Rental]) -> Result<()> {
        rentals.iter().try_for_each(Rental::validate)
    }

    pub(crate) fn replace_all(&self, rentals: Vec<Rental>) {
        let mut guard = self.rentals.write();
        *guard = rentals;
        debug!("Restored {} rentals", guard.len());
    }

    pub fn len(&self) -> usize {
        self.rentals.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rentals.read().is_empty()
    }
}

impl RentalOperations for RentalManager {
    fn register_rental(&self, request: RentalRequest) -> Result<RentalReceipt> {
        validate_dates(request.start, request.end)?;
        require_non_negative_f64("mileage", request.mileage)?;
        request.customer.validate()?;

        let vehicle = self
            .fleet
            .find(&request.plate)
            .ok_or_else(|| RentalError::not_found(Entity::Vehicle, request.plate.trim()))?;
        let billable = vehicle.as_billable().ok_or_else(|| RentalError::NotBillable {
            plate: vehicle.plate.to_string(),
        })?;

        let daily_rate = request.daily_rate.unwrap_or(vehicle.daily_price);
        if daily_rate.is_negative() {
            return Err(RentalError::invalid("daily rate", "must not be negative"));
        }
        let days = u32::try_from((request.end - request.start).num_days())
            .map_err(|_| RentalError::invalid("rental period", "too long"))?;
        let invoice = billable.invoice(&self.policy, days, daily_rate, request.apply_discount);

        let vehicle = self.fleet.check_out(&request.plate)?;
        let rental = Rental {
            id: ids::new_uuid(),
            customer: request.customer,
            vehicle,
            start: request.start,
            end: request.end,
            mileage: request.mileage,
            total_amount: invoice.total,
            contract_type: request.contract_type,
        };

        self.rentals.write().push(rental.clone());
        info!(
            "Recorded rental {} for {} on vehicle {} (total ${})",
            rental.id, rental.customer.national_id, rental.vehicle.plate, rental.total_amount
        );

        if let Err(e) = self.contracts.write(&rental, &invoice) {
            warn!("Failed to write contract for rental {}: {}", rental.id, e);
        }

        Ok(RentalReceipt { rental, invoice })
    }

    fn find(&self, id: &str) -> Option<Rental> {
        self.rentals.read().iter().find(|r| r.id == id).cloned()
    }

    fn history(&self) -> Vec<Rental> {
        self.rentals.read().clone()
    }

    fn for_customer(&self, national_id: &str) -> Vec<Rental> {
        self.rentals
            .read()
            .iter()
            .filter(|r| r.customer.has_national_id(national_id))
            .cloned()
            .collect()
    }

    fn find_active_rental_on(&self, national_id: &str, date: NaiveDate) -> Option<Rental> {
        self.rentals
            .read()
            .iter()
            .find(|r| r.customer.has_national_id(national_id) && r.covers(date))
            .cloned()
    }
}

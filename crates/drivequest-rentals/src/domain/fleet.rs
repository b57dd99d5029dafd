use crate::domain::billing::{Billable, BillingPolicy};
use crate::domain::rentals::Rental;
use crate::domain::types::{
    current_year, require_non_negative_f64, require_text, Money, Plate, VehicleStatus,
};
use crate::error::{Entity, RentalError, Result};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

const MIN_YEAR: i32 = 1900;

/// Variant-specific vehicle attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VehicleKind {
    Cargo { capacity_kg: f64 },
    Passenger { seats: u32 },
}

impl VehicleKind {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleKind::Cargo { .. } => "Cargo vehicle",
            VehicleKind::Passenger { .. } => "Passenger vehicle",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            VehicleKind::Cargo { capacity_kg } => {
                require_non_negative_f64("cargo capacity", *capacity_kg)?;
            }
            VehicleKind::Passenger { seats } => {
                if *seats == 0 {
                    return Err(RentalError::invalid("seats", "must be at least 1"));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleKind::Cargo { capacity_kg } => write!(f, "cargo, {capacity_kg} kg"),
            VehicleKind::Passenger { seats } => write!(f, "passenger, {seats} seats"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub plate: Plate,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub status: VehicleStatus,
    pub daily_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    pub kind: VehicleKind,
}

impl Vehicle {
    /// Builds an available vehicle after validating every field.
    pub fn new(
        id: &str,
        plate: &str,
        make: &str,
        model: &str,
        year: i32,
        daily_price: Money,
        kind: VehicleKind,
    ) -> Result<Self> {
        let vehicle = Self {
            id: require_text("vehicle id", id)?,
            plate: Plate::new(plate)?,
            make: require_text("make", make)?,
            model: require_text("model", model)?,
            year,
            status: VehicleStatus::Available,
            daily_price,
            photo_path: None,
            kind,
        };
        vehicle.validate()?;
        Ok(vehicle)
    }

    pub fn with_photo(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.photo_path = (!path.trim().is_empty()).then_some(path);
        self
    }

    pub fn with_status(mut self, status: VehicleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_text("vehicle id", &self.id)?;
        require_text("make", &self.make)?;
        require_text("model", &self.model)?;

        let max_year = current_year();
        if !(MIN_YEAR..=max_year).contains(&self.year) {
            return Err(RentalError::invalid(
                "year",
                format!("{} is outside {MIN_YEAR}..={max_year}", self.year),
            ));
        }
        if self.daily_price.is_negative() {
            return Err(RentalError::invalid("daily price", "must not be negative"));
        }
        self.kind.validate()
    }

    /// Billing capability of this vehicle, if its variant exposes one.
    pub fn as_billable(&self) -> Option<&dyn Billable> {
        match self.kind {
            VehicleKind::Cargo { .. } | VehicleKind::Passenger { .. } => Some(self),
        }
    }

    /// One-line description used in contracts and listings.
    pub fn describe(&self) -> String {
        format!(
            "{} {} {} ({}) - {} - ${}/day - {}",
            self.make, self.model, self.year, self.plate, self.kind, self.daily_price, self.status
        )
    }
}

impl Billable for Vehicle {
    fn billing_label(&self) -> &'static str {
        self.kind.label()
    }

    fn billing_plate(&self) -> &Plate {
        &self.plate
    }

    fn discount_rate(&self, policy: &BillingPolicy) -> Decimal {
        match self.kind {
            VehicleKind::Cargo { .. } => policy.cargo_discount,
            VehicleKind::Passenger { .. } => policy.passenger_discount,
        }
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Fleet inventory operations
pub trait FleetOperations: Send + Sync {
    fn add(&self, vehicle: Vehicle) -> Result<()>;
    fn find(&self, plate: &str) -> Option<Vehicle>;
    fn list(&self) -> Vec<Vehicle>;
    fn list_available(&self) -> Vec<Vehicle>;
    fn change_status(&self, plate: &str, status: VehicleStatus) -> Result<()>;
    fn remove(&self, plate: &str) -> bool;

    /// Moves an available vehicle to `Rented` in one step.
    fn check_out(&self, plate: &str) -> Result<Vehicle>;
}

/// In-memory fleet. Every operation, including the plate uniqueness check on
/// insert, runs under the same lock.
pub struct FleetManager {
    vehicles: RwLock<Vec<Vehicle>>,
}

impl FleetManager {
    pub fn new() -> Self {
        Self {
            vehicles: RwLock::new(Vec::new()),
        }
    }

    /// Replaces the fleet with previously persisted vehicles. On failure the
    /// fleet is left untouched.
    pub fn restore(&self, vehicles: Vec<Vehicle>) -> Result<()> {
        Self::check_restore(&vehicles)?;
        self.replace_all(vehicles);
        Ok(())
    }

    /// Applies the `add` rules to a persisted collection.
    pub fn check_restore(vehicles: &[Vehicle]) -> Result<()> {
        for (index, vehicle) in vehicles.iter().enumerate() {
            vehicle.validate()?;
            if vehicles[..index].iter().any(|v| v.plate == vehicle.plate) {
                return Err(RentalError::duplicate(
                    Entity::Vehicle,
                    vehicle.plate.as_str(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn replace_all(&self, vehicles: Vec<Vehicle>) {
        let mut guard = self.vehicles.write();
        *guard = vehicles;
        debug!("Restored {} vehicles", guard.len());
    }

    pub fn len(&self) -> usize {
        self.vehicles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.read().is_empty()
    }

    /// Maintenance may start from any state.
    pub fn mark_in_maintenance(&self, plate: &str) -> Result<()> {
        self.change_status(plate, VehicleStatus::InMaintenance)
    }

    /// Vehicles that appear in at least one rental lasting `min_days` or more.
    pub fn vehicles_with_long_rentals(&self, rentals: &[Rental], min_days: i64) -> Vec<Vehicle> {
        let plates: BTreeSet<&Plate> = rentals
            .iter()
            .filter(|r| r.duration_days() >= min_days)
            .map(|r| &r.vehicle.plate)
            .collect();

        self.vehicles
            .read()
            .iter()
            .filter(|v| plates.contains(&v.plate))
            .cloned()
            .collect()
    }
}

impl Default for FleetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetOperations for FleetManager {
    fn add(&self, vehicle: Vehicle) -> Result<()> {
        vehicle.validate()?;

        let mut vehicles = self.vehicles.write();
        if vehicles.iter().any(|v| v.plate == vehicle.plate) {
            return Err(RentalError::duplicate(
                Entity::Vehicle,
                vehicle.plate.as_str(),
            ));
        }

        info!("Added vehicle {} to the fleet", vehicle.plate);
        vehicles.push(vehicle);
        Ok(())
    }

    fn find(&self, plate: &str) -> Option<Vehicle> {
        self.vehicles
            .read()
            .iter()
            .find(|v| v.plate.matches(plate))
            .cloned()
    }

    fn list(&self) -> Vec<Vehicle> {
        self.vehicles.read().clone()
    }

    fn list_available(&self) -> Vec<Vehicle> {
        self.vehicles
            .read()
            .iter()
            .filter(|v| v.status.is_available())
            .cloned()
            .collect()
    }

    fn change_status(&self, plate: &str, status: VehicleStatus) -> Result<()> {
        let mut vehicles = self.vehicles.write();
        let vehicle = vehicles
            .iter_mut()
            .find(|v| v.plate.matches(plate))
            .ok_or_else(|| RentalError::not_found(Entity::Vehicle, plate.trim()))?;

        info!(
            "Vehicle {} status: {} -> {}",
            vehicle.plate, vehicle.status, status
        );
        vehicle.status = status;
        Ok(())
    }

    fn remove(&self, plate: &str) -> bool {
        let mut vehicles = self.vehicles.write();
        let before = vehicles.len();
        vehicles.retain(|v| !v.plate.matches(plate));
        vehicles.len() != before
    }

    fn check_out(&self, plate: &str) -> Result<Vehicle> {
        let mut vehicles = self.vehicles.write();
        let vehicle = vehicles
            .iter_mut()
            .find(|v| v.plate.matches(plate))
            .ok_or_else(|| RentalError::not_found(Entity::Vehicle, plate.trim()))?;

        if !vehicle.status.is_available() {
            return Err(RentalError::VehicleUnavailable {
                plate: vehicle.plate.to_string(),
                status: vehicle.status.to_string(),
            });
        }

        vehicle.status = VehicleStatus::Rented;
        Ok(vehicle.clone())
    }
}

use crate::domain::fleet::{FleetManager, FleetOperations};
use crate::domain::types::{
    require_non_negative_f64, require_not_future, require_text, Money, Plate,
};
use crate::error::{Entity, RentalError, Result};
use chrono::NaiveDate;
use drivequest_common::ids;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintenance {
    pub id: String,
    pub vehicle_plate: Plate,
    pub description: String,
    pub date: NaiveDate,
    pub cost: Money,
    pub mileage: f64,
}

impl Maintenance {
    pub fn new(
        vehicle_plate: &str,
        description: &str,
        date: NaiveDate,
        cost: Money,
        mileage: f64,
    ) -> Result<Self> {
        let record = Self {
            id: ids::short_id("MNT"),
            vehicle_plate: Plate::new(vehicle_plate)?,
            description: require_text("description", description)?,
            date,
            cost,
            mileage,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<()> {
        require_text("maintenance id", &self.id)?;
        require_text("description", &self.description)?;
        require_not_future("maintenance date", self.date)?;
        if self.cost.is_negative() {
            return Err(RentalError::invalid("cost", "must not be negative"));
        }
        require_non_negative_f64("mileage", self.mileage)?;
        Ok(())
    }
}

impl fmt::Display for Maintenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} | ${} | {} km",
            self.id, self.vehicle_plate, self.date, self.description, self.cost, self.mileage
        )
    }
}

pub struct MaintenanceManager {
    records: RwLock<Vec<Maintenance>>,
    fleet: Arc<FleetManager>,
}

impl MaintenanceManager {
    pub fn new(fleet: Arc<FleetManager>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            fleet,
        }
    }

    /// Records maintenance for a fleet vehicle and moves it to `InMaintenance`.
    pub fn register(
        &self,
        plate: &str,
        description: &str,
        date: NaiveDate,
        cost: Money,
        mileage: f64,
    ) -> Result<Maintenance> {
        let record = Maintenance::new(plate, description, date, cost, mileage)?;
        if self.fleet.find(plate).is_none() {
            return Err(RentalError::not_found(Entity::Vehicle, record.vehicle_plate.as_str()));
        }

        self.fleet.mark_in_maintenance(plate)?;
        info!(
            "Registered maintenance {} for vehicle {}",
            record.id, record.vehicle_plate
        );
        self.records.write().push(record.clone());
        Ok(record)
    }

    pub fn restore(&self, records: Vec<Maintenance>) -> Result<()> {
        Self::check_restore(&records)?;
        self.replace_all(records);
        Ok(())
    }

    pub fn check_restore(records: &[Maintenance]) -> Result<()> {
        records.iter().try_for_each(Maintenance::validate)
    }

    pub(crate) fn replace_all(&self, records: Vec<Maintenance>) {
        let mut guard = self.records.write();
        *guard = records;
        debug!("Restored {} maintenance records", guard.len());
    }

    pub fn list(&self) -> Vec<Maintenance> {
        self.records.read().clone()
    }

    pub fn for_vehicle(&self, plate: &str) -> Vec<Maintenance> {
        self.records
            .read()
            .iter()
            .filter(|m| m.vehicle_plate.matches(plate))
            .cloned()
            .collect()
    }

    pub fn total_cost(&self) -> Money {
        self.records.read().iter().map(|m| m.cost).sum()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fleet::{Vehicle, VehicleKind};
    use crate::domain::types::{today, VehicleStatus};

    fn fleet_with(plate: &str) -> Arc<FleetManager> {
        let fleet = Arc::new(FleetManager::new());
        fleet
            .add(
                Vehicle::new(
                    "v-1",
                    plate,
                    "Nissan",
                    "NP300",
                    2017,
                    Money::from_units(28_000),
                    VehicleKind::Cargo { capacity_kg: 1100.0 },
                )
                .unwrap(),
            )
            .unwrap();
        fleet
    }

    #[test]
    fn test_register_moves_vehicle_to_maintenance() {
        let fleet = fleet_with("KK8888");
        fleet.check_out("KK8888").unwrap();
        let manager = MaintenanceManager::new(fleet.clone());

        let record = manager
            .register("kk8888", "Brake pads", today(), Money::from_units(85_000), 54_000.0)
            .unwrap();

        assert!(record.id.starts_with("MNT-"));
        assert_eq!(
            fleet.find("KK8888").unwrap().status,
            VehicleStatus::InMaintenance
        );
        assert_eq!(manager.for_vehicle("KK8888").len(), 1);
        assert_eq!(manager.total_cost(), Money::from_units(85_000));
    }

    #[test]
    fn test_invalid_records_are_rejected() {
        let manager = MaintenanceManager::new(fleet_with("LL9999"));
        let tomorrow = today().succ_opt().unwrap();

        assert!(manager
            .register("LL9999", "Oil", tomorrow, Money::ZERO, 0.0)
            .is_err());
        assert!(manager
            .register("LL9999", " ", today(), Money::ZERO, 0.0)
            .is_err());
        assert!(manager
            .register("LL9999", "Oil", today(), Money::from_units(-5), 0.0)
            .is_err());
        assert!(matches!(
            manager.register("MM0000", "Oil", today(), Money::ZERO, 0.0),
            Err(RentalError::NotFound { .. })
        ));
        assert!(manager.is_empty());
    }
}

//! Explicit wiring of the DriveQuest stores.
//!
//! Every store is built once here and handed out as an `Arc`; nothing is
//! reachable through global state.

use crate::config::RentalsConfig;
use crate::domain::{
    Customer, CustomerOperations, CustomerRegistry, FleetManager, FleetOperations, Maintenance,
    MaintenanceManager, Money, Payment, PaymentManager, Rental, RentalManager, RentalOperations,
    Reservation, ReservationManager, ReservationOperations, Vehicle,
};
use crate::error::Result;
use crate::scheduler::{
    ActiveReservationReport, FleetAvailabilityCheck, ReservationEndingReminder, Scheduler,
};
use crate::storage::{ContractWriter, SnapshotStore};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub struct Services {
    pub customers: Arc<CustomerRegistry>,
    pub fleet: Arc<FleetManager>,
    pub reservations: Arc<ReservationManager>,
    pub rentals: Arc<RentalManager>,
    pub payments: Arc<PaymentManager>,
    pub maintenance: Arc<MaintenanceManager>,
    snapshots: SnapshotStore,
}

/// Entity counts and running totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub customers: usize,
    pub vehicles: usize,
    pub available_vehicles: usize,
    pub reservations: usize,
    pub rentals: usize,
    pub payments: usize,
    pub maintenance_records: usize,
    pub total_paid: Money,
    pub total_maintenance_cost: Money,
}

impl Services {
    pub fn new(config: &RentalsConfig) -> Self {
        let policy = config.billing.policy();
        let fleet = Arc::new(FleetManager::new());

        Self {
            customers: Arc::new(CustomerRegistry::new()),
            reservations: Arc::new(ReservationManager::new()),
            rentals: Arc::new(RentalManager::new(
                fleet.clone(),
                policy,
                ContractWriter::new(&config.storage.contracts_dir),
            )),
            payments: Arc::new(PaymentManager::new(policy)),
            maintenance: Arc::new(MaintenanceManager::new(fleet.clone())),
            fleet,
            snapshots: SnapshotStore::new(&config.storage.data_dir),
        }
    }

    /// Replaces store contents with the persisted snapshots. Every file is
    /// loaded and checked against its store's rules before any store is
    /// replaced, so a failure leaves all of them as they were.
    pub fn load_snapshots(&self) -> Result<()> {
        let customers: Vec<Customer> = self.snapshots.load()?;
        let vehicles: Vec<Vehicle> = self.snapshots.load()?;
        let reservations: Vec<Reservation> = self.snapshots.load()?;
        let rentals: Vec<Rental> = self.snapshots.load()?;
        let payments: Vec<Payment> = self.snapshots.load()?;
        let maintenance: Vec<Maintenance> = self.snapshots.load()?;

        CustomerRegistry::check_restore(&customers)?;
        FleetManager::check_restore(&vehicles)?;
        ReservationManager::check_restore(&reservations)?;
        RentalManager::check_restore(&rentals)?;
        PaymentManager::check_restore(&payments)?;
        MaintenanceManager::check_restore(&maintenance)?;

        self.customers.replace_all(customers);
        self.fleet.replace_all(vehicles);
        self.reservations.replace_all(reservations);
        self.rentals.replace_all(rentals);
        self.payments.replace_all(payments);
        self.maintenance.replace_all(maintenance);

        info!(
            "Loaded snapshots from {}: {} customers, {} vehicles, {} reservations, {} rentals",
            self.snapshots.dir().display(),
            self.customers.len(),
            self.fleet.len(),
            self.reservations.len(),
            self.rentals.len()
        );
        Ok(())
    }

    pub fn save_snapshots(&self) -> Result<()> {
        self.snapshots.save(&self.customers.list())?;
        self.snapshots.save(&self.fleet.list())?;
        self.snapshots.save(&self.reservations.list_all())?;
        self.snapshots.save(&self.rentals.history())?;
        self.snapshots.save(&self.payments.list())?;
        self.snapshots.save(&self.maintenance.list())?;

        info!("Saved snapshots to {}", self.snapshots.dir().display());
        Ok(())
    }

    /// Schedules the reminder and availability jobs configured in `config`.
    pub async fn schedule_jobs(&self, scheduler: &Scheduler, config: &RentalsConfig) -> Result<()> {
        let settings = &config.scheduler;
        scheduler
            .schedule(
                Arc::new(ReservationEndingReminder::new(
                    self.reservations.clone(),
                    settings.ending_window_days,
                )),
                settings.reservation_check_interval(),
            )
            .await?;
        scheduler
            .schedule(
                Arc::new(ActiveReservationReport::new(self.reservations.clone())),
                settings.reservation_check_interval(),
            )
            .await?;
        scheduler
            .schedule(
                Arc::new(FleetAvailabilityCheck::new(self.fleet.clone())),
                settings.fleet_check_interval(),
            )
            .await
    }

    pub fn summary(&self) -> Summary {
        Summary {
            customers: self.customers.len(),
            vehicles: self.fleet.len(),
            available_vehicles: self.fleet.list_available().len(),
            reservations: self.reservations.len(),
            rentals: self.rentals.len(),
            payments: self.payments.len(),
            maintenance_records: self.maintenance.len(),
            total_paid: self.payments.total_paid(),
            total_maintenance_cost: self.maintenance.total_cost(),
        }
    }
}

pub mod billing;
pub mod customers;
pub mod fleet;
pub mod maintenance;
pub mod payments;
pub mod rentals;
pub mod reservations;
pub mod types;

pub use billing::{Billable, BillingPolicy, Invoice};
pub use customers::{Customer, CustomerOperations, CustomerRegistry};
pub use fleet::{FleetManager, FleetOperations, Vehicle, VehicleKind};
pub use maintenance::{Maintenance, MaintenanceManager};
pub use payments::{Payment, PaymentManager, PaymentMethod};
pub use rentals::{
    ContractType, Rental, RentalManager, RentalOperations, RentalReceipt, RentalRequest,
};
pub use reservations::{Reservation, ReservationManager, ReservationOperations};
pub use types::{Money, Plate, VehicleStatus};

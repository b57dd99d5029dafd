use super::{Notice, ScheduledJob};
use crate::domain::{FleetManager, FleetOperations, ReservationManager, VehicleStatus};
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Warns about reservations ending within the next few days.
pub struct ReservationEndingReminder {
    reservations: Arc<ReservationManager>,
    window_days: u32,
}

impl ReservationEndingReminder {
    pub const NAME: &'static str = "reservation-ending-reminder";

    pub fn new(reservations: Arc<ReservationManager>, window_days: u32) -> Self {
        Self {
            reservations,
            window_days,
        }
    }
}

impl ScheduledJob for ReservationEndingReminder {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, now: NaiveDateTime) -> Vec<Notice> {
        self.reservations
            .ending_within(now.date(), self.window_days)
            .into_iter()
            .map(|r| {
                Notice::warning(
                    Self::NAME,
                    format!(
                        "Reservation {} for {} ({}) ends on {}",
                        r.code,
                        r.customer.full_name,
                        r.plate(),
                        r.end.date()
                    ),
                )
            })
            .collect()
    }
}

/// Lists reservations in progress.
pub struct ActiveReservationReport {
    reservations: Arc<ReservationManager>,
}

impl ActiveReservationReport {
    pub const NAME: &'static str = "active-reservation-report";

    pub fn new(reservations: Arc<ReservationManager>) -> Self {
        Self { reservations }
    }
}

impl ScheduledJob for ActiveReservationReport {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, now: NaiveDateTime) -> Vec<Notice> {
        self.reservations
            .active_at(now)
            .into_iter()
            .map(|r| {
                Notice::info(
                    Self::NAME,
                    format!(
                        "Reservation {} active: {} has {} until {}",
                        r.code,
                        r.customer.full_name,
                        r.plate(),
                        r.end
                    ),
                )
            })
            .collect()
    }
}

/// Reports vehicles that cannot currently be rented.
pub struct FleetAvailabilityCheck {
    fleet: Arc<FleetManager>,
}

impl FleetAvailabilityCheck {
    pub const NAME: &'static str = "fleet-availability-check";

    pub fn new(fleet: Arc<FleetManager>) -> Self {
        Self { fleet }
    }
}

impl ScheduledJob for FleetAvailabilityCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn run(&self, _now: NaiveDateTime) -> Vec<Notice> {
        self.fleet
            .list()
            .into_iter()
            .filter_map(|v| match v.status {
                VehicleStatus::Available => None,
                VehicleStatus::Rented => Some(Notice::info(
                    Self::NAME,
                    format!("Vehicle {} is rented", v.plate),
                )),
                VehicleStatus::InMaintenance => Some(Notice::warning(
                    Self::NAME,
                    format!("Vehicle {} is in maintenance", v.plate),
                )),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Customer, Money, Reservation, ReservationOperations, Vehicle, VehicleKind,
    };
    use crate::scheduler::NoticeLevel;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn vehicle(plate: &str) -> Vehicle {
        Vehicle::new(
            "v-1",
            plate,
            "Chevrolet",
            "Sail",
            2021,
            Money::from_units(22_000),
            VehicleKind::Passenger { seats: 5 },
        )
        .unwrap()
    }

    fn reservations() -> Arc<ReservationManager> {
        let customer = Customer::new(
            "c-1",
            "Tomás Fuentes",
            "7.777.777-7",
            "+56966667777",
            "tomas@example.com",
            "Camino Real 8",
        )
        .unwrap();
        let store = Arc::new(ReservationManager::new());
        store
            .register(
                Reservation::new(
                    "R-1",
                    customer.clone(),
                    vehicle("NN1111"),
                    at(2024, 6, 1),
                    at(2024, 6, 4),
                )
                .unwrap(),
            )
            .unwrap();
        store
            .register(
                Reservation::new(
                    "R-2",
                    customer,
                    vehicle("PP2222"),
                    at(2024, 6, 1),
                    at(2024, 6, 20),
                )
                .unwrap(),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_ending_reminder() {
        let job = ReservationEndingReminder::new(reservations(), 3);
        let notices = job.run(at(2024, 6, 2));
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
        assert!(notices[0].message.contains("R-1"));

        assert!(job.run(at(2024, 6, 4)).is_empty());
    }

    #[test]
    fn test_ending_reminder_with_huge_window() {
        let job = ReservationEndingReminder::new(reservations(), u32::MAX);
        assert_eq!(job.run(at(2024, 6, 2)).len(), 2);
    }

    #[test]
    fn test_active_report() {
        let job = ActiveReservationReport::new(reservations());
        assert_eq!(job.run(at(2024, 6, 3)).len(), 2);
        assert_eq!(job.run(at(2024, 6, 10)).len(), 1);
        assert!(job.run(at(2024, 7, 1)).is_empty());
    }

    #[test]
    fn test_fleet_availability() {
        let fleet = Arc::new(FleetManager::new());
        fleet.add(vehicle("QQ3333")).unwrap();
        fleet.add(vehicle("RR4444")).unwrap();
        fleet.add(vehicle("SS5555")).unwrap();
        fleet.check_out("RR4444").unwrap();
        fleet.mark_in_maintenance("SS5555").unwrap();

        let job = FleetAvailabilityCheck::new(fleet);
        let notices = job.run(at(2024, 6, 1));
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].level, NoticeLevel::Warning);
    }
}

//! Reservation store
//!
//! Booking codes are unique across the store, and for any one vehicle the
//! half-open `[start, end)` intervals of its reservations never intersect.
//! Both rules are checked and the insert performed under a single lock, so
//! concurrent registrations cannot both pass the checks.

use crate::domain::customers::Customer;
use crate::domain::fleet::Vehicle;
use crate::domain::types::{require_text, Money, Plate};
use crate::error::{Entity, RentalError, Result};
use chrono::{Days, NaiveDate, NaiveDateTime};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub code: String,
    pub customer: Customer,
    pub vehicle: Vehicle,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub confirmed: bool,
}

impl Reservation {
    /// Builds an unconfirmed reservation. `end` must be strictly after `start`.
    pub fn new(
        code: &str,
        customer: Customer,
        vehicle: Vehicle,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self> {
        let reservation = Self {
            code: require_text("reservation code", code)?,
            customer,
            vehicle,
            start,
            end,
            confirmed: false,
        };
        reservation.validate()?;
        Ok(reservation)
    }

    pub fn validate(&self) -> Result<()> {
        require_text("reservation code", &self.code)?;
        if self.end <= self.start {
            return Err(RentalError::date_range(self.start, self.end));
        }
        Ok(())
    }

    pub fn plate(&self) -> &Plate {
        &self.vehicle.plate
    }

    /// Same vehicle and intersecting half-open intervals.
    pub fn overlaps(&self, other: &Reservation) -> bool {
        self.plate() == other.plate() && self.start < other.end && self.end > other.start
    }

    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now <= self.end
    }

    /// Whole days booked, never less than one.
    pub fn billable_days(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }

    pub fn final_price(&self) -> Money {
        self.vehicle
            .daily_price
            .multiply(Decimal::from(self.billable_days()))
    }
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} -> {} | {}",
            self.code,
            self.customer.full_name,
            self.plate(),
            self.start,
            self.end,
            if self.confirmed { "confirmed" } else { "pending" }
        )
    }
}

/// Reservation store operations
pub trait ReservationOperations: Send + Sync {
    /// Fails with `DuplicateKey` on a reused code, `OverlappingBooking` on a
    /// conflicting interval for the same vehicle. The store is unchanged on
    /// failure.
    fn register(&self, reservation: Reservation) -> Result<()>;
    fn remove(&self, code: &str) -> bool;
    fn find_by_code(&self, code: &str) -> Option<Reservation>;
    /// Copy of the current reservations.
    fn list_all(&self) -> Vec<Reservation>;
    fn confirm(&self, code: &str) -> bool;
}

pub struct ReservationManager {
    reservations: Mutex<Vec<Reservation>>,
}

impl ReservationManager {
    pub fn new() -> Self {
        Self {
            reservations: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the contents with previously persisted reservations.
    ///
    /// The same code and overlap rules as [`ReservationOperations::register`]
    /// apply; the first conflicting record aborts the restore and leaves the
    /// store untouched.
    pub fn restore(&self, reservations: Vec<Reservation>) -> Result<()> {
        Self::check_restore(&reservations)?;
        self.replace_all(reservations);
        Ok(())
    }

    /// Checks each record against the ones persisted before it.
    pub fn check_restore(reservations: &[Reservation]) -> Result<()> {
        for (index, reservation) in reservations.iter().enumerate() {
            reservation.validate()?;
            check_insert(&reservations[..index], reservation)?;
        }
        Ok(())
    }

    pub(crate) fn replace_all(&self, reservations: Vec<Reservation>) {
        let mut guard = self.reservations.lock();
        *guard = reservations;
        debug!("Restored {} reservations", guard.len());
    }

    pub fn len(&self) -> usize {
        self.reservations.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.lock().is_empty()
    }

    pub fn active_at(&self, now: NaiveDateTime) -> Vec<Reservation> {
        self.reservations
            .lock()
            .iter()
            .filter(|r| r.is_active_at(now))
            .cloned()
            .collect()
    }

    /// Reservations whose end date falls strictly between `today` and
    /// `today + days`.
    /// A window reaching past the calendar's end is clamped to it.
    pub fn ending_within(&self, today: NaiveDate, days: u32) -> Vec<Reservation> {
        let limit = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        self.reservations
            .lock()
            .iter()
            .filter(|r| {
                let end = r.end.date();
                end > today && end < limit
            })
            .cloned()
            .collect()
    }

    pub fn for_vehicle(&self, plate: &str) -> Vec<Reservation> {
        self.reservations
            .lock()
            .iter()
            .filter(|r| r.plate().matches(plate))
            .cloned()
            .collect()
    }
}

impl Default for ReservationManager {
    fn default() -> Self {
        Self::new()
    }
}

fn check_insert(existing: &[Reservation], candidate: &Reservation) -> Result<()> {
    if existing.iter().any(|r| r.code == candidate.code) {
        return Err(RentalError::duplicate(Entity::Reservation, &candidate.code));
    }
    if let Some(conflict) = existing.iter().find(|r| r.overlaps(candidate)) {
        debug!(
            "Reservation {} conflicts with {} on {}",
            candidate.code,
            conflict.code,
            candidate.plate()
        );
        return Err(RentalError::OverlappingBooking {
            code: candidate.code.clone(),
            plate: candidate.plate().to_string(),
        });
    }
    Ok(())
}

impl ReservationOperations for ReservationManager {
    fn register(&self, reservation: Reservation) -> Result<()> {
        reservation.validate()?;

        let mut reservations = self.reservations.lock();
        check_insert(&reservations, &reservation)?;

        info!(
            "Registered reservation {} for vehicle {}",
            reservation.code,
            reservation.plate()
        );
        reservations.push(reservation);
        Ok(())
    }

    fn remove(&self, code: &str) -> bool {
        let mut reservations = self.reservations.lock();
        let before = reservations.len();
        reservations.retain(|r| r.code != code);
        reservations.len() != before
    }

    fn find_by_code(&self, code: &str) -> Option<Reservation> {
        self.reservations
            .lock()
            .iter()
            .find(|r| r.code == code)
            .cloned()
    }

    fn list_all(&self) -> Vec<Reservation> {
        self.reservations.lock().clone()
    }

    fn confirm(&self, code: &str) -> bool {
        let mut reservations = self.reservations.lock();
        match reservations.iter_mut().find(|r| r.code == code) {
            Some(reservation) => {
                reservation.confirmed = true;
                info!("Confirmed reservation {}", code);
                true
            }
            None => false,
        }
    }
}

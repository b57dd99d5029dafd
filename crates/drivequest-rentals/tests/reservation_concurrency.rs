use chrono::{NaiveDate, NaiveDateTime};
use drivequest_rentals::domain::{
    Customer, Money, Reservation, ReservationManager, ReservationOperations, Vehicle, VehicleKind,
};
use drivequest_rentals::RentalError;
use std::sync::{Arc, Barrier};
use std::thread;

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 8, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn reservation(code: &str, start: u32, end: u32) -> Reservation {
    let customer = Customer::new(
        "",
        "Camila Reyes",
        "15.151.515-1",
        "+56977778888",
        "camila@example.com",
        "Los Leones 200",
    )
    .unwrap();
    let vehicle = Vehicle::new(
        "v-1",
        "TT6666",
        "Peugeot",
        "Partner",
        2022,
        Money::from_units(32_000),
        VehicleKind::Cargo { capacity_kg: 650.0 },
    )
    .unwrap();
    Reservation::new(code, customer, vehicle, at(start), at(end)).unwrap()
}

/// Races two registrations and returns the outcome of each.
fn race(first: Reservation, second: Reservation) -> (Arc<ReservationManager>, Vec<Result<(), RentalError>>) {
    let store = Arc::new(ReservationManager::new());
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = [first, second]
        .into_iter()
        .map(|reservation| {
            let store = store.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                store.register(reservation)
            })
        })
        .collect();

    let results = handles.into_iter().map(|h| h.join().unwrap()).collect();
    (store, results)
}

#[test]
fn concurrent_overlapping_registrations_admit_exactly_one() {
    for _ in 0..200 {
        let (store, results) = race(reservation("A", 1, 5), reservation("B", 3, 8));

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, RentalError::OverlappingBooking { .. })));
        assert_eq!(store.for_vehicle("TT6666").len(), 1);
    }
}

#[test]
fn concurrent_duplicate_codes_admit_exactly_one() {
    for _ in 0..200 {
        let (store, results) = race(reservation("SAME", 1, 2), reservation("SAME", 10, 12));

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, RentalError::DuplicateKey { .. })));
        assert_eq!(store.list_all().len(), 1);
    }
}

#[test]
fn concurrent_disjoint_registrations_all_succeed() {
    let store = Arc::new(ReservationManager::new());
    let handles: Vec<_> = (0..8u32)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                let start = 1 + i * 3;
                store.register(reservation(&format!("R-{i}"), start, start + 3))
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(store.list_all().len(), 8);
}

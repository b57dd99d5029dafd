use crate::error::{RentalError, Result};
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// Monetary amount. Kept exact internally; only `Display` rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn from_decimal(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn from_f64(amount: f64) -> Option<Self> {
        Decimal::from_f64(amount).map(Self)
    }

    pub fn from_units(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    /// Validated constructor for amounts that must not be negative.
    pub fn non_negative(field: &str, amount: Decimal) -> Result<Self> {
        if amount < Decimal::ZERO {
            return Err(RentalError::invalid(field, "must not be negative"));
        }
        Ok(Self(amount))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn add(&self, other: Money) -> Self {
        Self(self.0 + other.0)
    }

    pub fn subtract(&self, other: Money) -> Self {
        Self(self.0 - other.0)
    }

    pub fn multiply(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }

    /// Two-decimal presentation value.
    pub fn rounded(&self) -> Decimal {
        self.0.round_dp(2)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded())
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc.add(m))
    }
}

impl FromStr for Money {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self> {
        Decimal::from_str(s.trim())
            .map(Self)
            .map_err(|e| RentalError::invalid("amount", e.to_string()))
    }
}

/// Vehicle licence plate: trimmed, upper-cased, never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plate(String);

impl Plate {
    pub fn new(plate: impl AsRef<str>) -> Result<Self> {
        let plate = plate.as_ref().trim();
        if plate.is_empty() {
            return Err(RentalError::invalid("plate", "cannot be empty"));
        }
        Ok(Self(plate.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against raw user input, normalized the
    /// same way `new` does.
    pub fn matches(&self, raw: &str) -> bool {
        self.0 == raw.trim().to_uppercase()
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Plate {
    type Error = RentalError;

    fn try_from(value: String) -> Result<Self> {
        Plate::new(value)
    }
}

impl From<Plate> for String {
    fn from(plate: Plate) -> Self {
        plate.0
    }
}

/// Availability of a vehicle in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Rented,
    InMaintenance,
}

impl VehicleStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, VehicleStatus::Available)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Available => write!(f, "available"),
            VehicleStatus::Rented => write!(f, "rented"),
            VehicleStatus::InMaintenance => write!(f, "in_maintenance"),
        }
    }
}

impl FromStr for VehicleStatus {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "available" => Ok(VehicleStatus::Available),
            "rented" => Ok(VehicleStatus::Rented),
            "in_maintenance" | "maintenance" => Ok(VehicleStatus::InMaintenance),
            other => Err(RentalError::invalid(
                "vehicle status",
                format!("unknown status '{other}'"),
            )),
        }
    }
}

/// Trimmed copy of `value`, rejecting blank input.
pub fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RentalError::invalid(field, "cannot be empty"));
    }
    Ok(trimmed.to_string())
}

/// Rejects dates later than the local calendar day.
pub fn require_not_future(field: &str, date: NaiveDate) -> Result<NaiveDate> {
    let today = today();
    if date > today {
        return Err(RentalError::invalid(
            field,
            format!("{date} is in the future (today is {today})"),
        ));
    }
    Ok(date)
}

pub fn require_non_negative_f64(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(RentalError::invalid(field, "must be a non-negative number"));
    }
    Ok(value)
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn current_year() -> i32 {
    Local::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_keeps_full_precision() {
        let third = Money::from_decimal(dec!(10) / dec!(3));
        assert_ne!(third.as_decimal(), dec!(3.33));
        assert_eq!(third.to_string(), "3.33");
        assert_eq!(third.multiply(dec!(3)).rounded(), dec!(10.00));
    }

    #[test]
    fn test_money_non_negative() {
        assert!(Money::non_negative("cost", dec!(0)).is_ok());
        assert!(Money::non_negative("cost", dec!(-0.01)).is_err());
    }

    #[test]
    fn test_money_sum_and_parse() {
        let total: Money = ["10.50", "4.50"]
            .iter()
            .map(|s| s.parse::<Money>().unwrap())
            .sum();
        assert_eq!(total, Money::from_units(15));
        assert!("ten".parse::<Money>().is_err());
    }

    #[test]
    fn test_plate_is_normalized() {
        let plate = Plate::new("  abcd12 ").unwrap();
        assert_eq!(plate.as_str(), "ABCD12");
        assert!(plate.matches("AbCd12"));
        assert!(Plate::new("   ").is_err());
    }

    #[test]
    fn test_plate_matches_non_ascii_letters() {
        let plate = Plate::new("ñandú7").unwrap();
        assert_eq!(plate.as_str(), "ÑANDÚ7");
        assert!(plate.matches("ñandú7"));
        assert!(plate.matches(" ÑanDú7 "));
        assert!(!plate.matches("nandu7"));
    }

    #[test]
    fn test_plate_deserialization_validates() {
        let plate: Plate = serde_json::from_str("\"xy99\"").unwrap();
        assert_eq!(plate.as_str(), "XY99");
        assert!(serde_json::from_str::<Plate>("\"\"").is_err());
    }

    #[test]
    fn test_vehicle_status_parsing() {
        assert_eq!(
            "Available".parse::<VehicleStatus>().unwrap(),
            VehicleStatus::Available
        );
        assert_eq!(
            "in maintenance".parse::<VehicleStatus>().unwrap(),
            VehicleStatus::InMaintenance
        );
        assert!("lost".parse::<VehicleStatus>().is_err());
        assert_eq!(VehicleStatus::Rented.to_string(), "rented");
    }

    #[test]
    fn test_require_helpers() {
        assert_eq!(require_text("name", "  Ana  ").unwrap(), "Ana");
        assert!(require_text("name", "").is_err());
        assert!(require_not_future("date", today()).is_ok());
        assert!(require_not_future("date", today().succ_opt().unwrap()).is_err());
        assert!(require_non_negative_f64("mileage", -1.0).is_err());
        assert!(require_non_negative_f64("mileage", f64::NAN).is_err());
    }
}

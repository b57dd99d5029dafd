use crate::domain::billing::BillingPolicy;
use crate::domain::rentals::Rental;
use crate::domain::types::{require_not_future, require_text, today, Money};
use crate::error::{RentalError, Result};
use chrono::NaiveDate;
use drivequest_common::ids;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Transfer => write!(f, "transfer"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = RentalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            "card" => Ok(PaymentMethod::Card),
            "" => Err(RentalError::invalid("payment method", "cannot be empty")),
            other => Err(RentalError::invalid(
                "payment method",
                format!("unknown method '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub rental_id: String,
    pub customer_name: String,
    pub net: Money,
    pub tax: Money,
    pub total: Money,
    pub date: NaiveDate,
    pub method: PaymentMethod,
}

impl Payment {
    /// Invariants: total = net + tax, no negative amounts, not dated in the future.
    pub fn validate(&self) -> Result<()> {
        require_text("payment id", &self.id)?;
        require_text("rental id", &self.rental_id)?;
        for (field, amount) in [("net", self.net), ("tax", self.tax), ("total", self.total)] {
            if amount.is_negative() {
                return Err(RentalError::invalid(field, "must not be negative"));
            }
        }
        if self.net.add(self.tax) != self.total {
            return Err(RentalError::invalid(
                "total",
                format!("{} does not equal net {} plus tax {}", self.total, self.net, self.tax),
            ));
        }
        require_not_future("payment date", self.date)?;
        Ok(())
    }
}

impl fmt::Display for Payment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | rental {} | {} | ${} + ${} = ${} | {} | {}",
            self.id,
            self.rental_id,
            self.customer_name,
            self.net,
            self.tax,
            self.total,
            self.date,
            self.method
        )
    }
}

pub struct PaymentManager {
    payments: RwLock<Vec<Payment>>,
    policy: BillingPolicy,
}

impl PaymentManager {
    pub fn new(policy: BillingPolicy) -> Self {
        Self {
            payments: RwLock::new(Vec::new()),
            policy,
        }
    }

    /// Records a payment of `net` against `rental`, taxed at the policy rate
    /// and dated today.
    pub fn register_payment(&self, rental: &Rental, net: Decimal, method: PaymentMethod) -> Result<Payment> {
        if net <= Decimal::ZERO {
            return Err(RentalError::invalid("net amount", "must be greater than zero"));
        }

        let net = Money::from_decimal(net);
        let tax = self.policy.tax_on(net);
        let payment = Payment {
            id: ids::short_id("PAY"),
            rental_id: rental.id.clone(),
            customer_name: rental.customer.full_name.clone(),
            net,
            tax,
            total: net.add(tax),
            date: today(),
            method,
        };
        payment.validate()?;

        info!(
            "Registered payment {} for rental {} (${})",
            payment.id, payment.rental_id, payment.total
        );
        self.payments.write().push(payment.clone());
        Ok(payment)
    }

    pub fn restore(&self, payments: Vec<Payment>) -> Result<()> {
        Self::check_restore(&payments)?;
        self.replace_all(payments);
        Ok(())
    }

    pub fn check_restore(payments: &[Payment]) -> Result<()> {
        payments.iter().try_for_each(Payment::validate)
    }

    pub(crate) fn replace_all(&self, payments: Vec<Payment>) {
        let mut guard = self.payments.write();
        *guard = payments;
        debug!("Restored {} payments", guard.len());
    }

    pub fn list(&self) -> Vec<Payment> {
        self.payments.read().clone()
    }

    pub fn total_paid(&self) -> Money {
        self.payments.read().iter().map(|p| p.total).sum()
    }

    pub fn by_method(&self, method: PaymentMethod) -> Vec<Payment> {
        self.payments
            .read()
            .iter()
            .filter(|p| p.method == method)
            .cloned()
            .collect()
    }

    pub fn for_rental(&self, rental_id: &str) -> Vec<Payment> {
        self.payments
            .read()
            .iter()
            .filter(|p| p.rental_id == rental_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.payments.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::customers::Customer;
    use crate::domain::fleet::{Vehicle, VehicleKind};
    use crate::domain::rentals::ContractType;
    use rust_decimal_macros::dec;

    fn rental() -> Rental {
        let customer = Customer::new(
            "c-1",
            "Pedro Díaz",
            "5.555.555-5",
            "+56944445555",
            "pedro@example.com",
            "Pasaje 3",
        )
        .unwrap();
        let vehicle = Vehicle::new(
            "v-1",
            "JJ7777",
            "Toyota",
            "Hilux",
            2018,
            Money::from_units(30_000),
            VehicleKind::Cargo { capacity_kg: 1000.0 },
        )
        .unwrap();
        Rental {
            id: "r-1".to_string(),
            customer,
            vehicle,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            mileage: 0.0,
            total_amount: Money::from_units(107_100),
            contract_type: ContractType::Basic,
        }
    }

    #[test]
    fn test_register_payment_applies_tax() {
        let manager = PaymentManager::new(BillingPolicy::default());
        let payment = manager
            .register_payment(&rental(), dec!(90000), PaymentMethod::Card)
            .unwrap();

        assert!(payment.id.starts_with("PAY-"));
        assert_eq!(payment.tax, Money::from_units(17_100));
        assert_eq!(payment.total, Money::from_units(107_100));
        assert_eq!(payment.date, today());
        assert_eq!(manager.total_paid(), Money::from_units(107_100));
        assert_eq!(manager.by_method(PaymentMethod::Card).len(), 1);
        assert!(manager.by_method(PaymentMethod::Cash).is_empty());
        assert_eq!(manager.for_rental("r-1").len(), 1);
    }

    #[test]
    fn test_non_positive_net_is_rejected() {
        let manager = PaymentManager::new(BillingPolicy::default());
        assert!(manager
            .register_payment(&rental(), dec!(0), PaymentMethod::Cash)
            .is_err());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_inconsistent_total_fails_validation() {
        let payment = Payment {
            id: "PAY-00000000".to_string(),
            rental_id: "r-1".to_string(),
            customer_name: "x".to_string(),
            net: Money::from_units(100),
            tax: Money::from_units(19),
            total: Money::from_units(120),
            date: today(),
            method: PaymentMethod::Transfer,
        };
        assert!(payment.validate().is_err());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(
            " Transfer ".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::Transfer
        );
        assert!("".parse::<PaymentMethod>().is_err());
        assert!("bitcoin".parse::<PaymentMethod>().is_err());
    }
}

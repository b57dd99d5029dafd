//! Invoice calculation for rentals.
//!
//! subtotal = days * daily rate
//! discount = subtotal * variant rate (only when requested)
//! net      = subtotal - discount
//! tax      = net * tax rate
//! total    = net + tax
//!
//! Amounts stay exact; rounding to two decimals happens in [`Invoice::render`].

use crate::domain::types::{Money, Plate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Tax and discount rates applied when invoicing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillingPolicy {
    pub tax_rate: Decimal,
    pub cargo_discount: Decimal,
    pub passenger_discount: Decimal,
}

impl Default for BillingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: dec!(0.19),
            cargo_discount: dec!(0.07),
            passenger_discount: dec!(0.12),
        }
    }
}

impl BillingPolicy {
    pub fn tax_on(&self, net: Money) -> Money {
        net.multiply(self.tax_rate)
    }
}

/// Itemised invoice for a rental period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub vehicle_label: String,
    pub plate: Plate,
    pub days: u32,
    pub daily_rate: Money,
    pub subtotal: Money,
    pub discount: Money,
    pub net: Money,
    pub tax: Money,
    pub total: Money,
    pub tax_rate: Decimal,
}

impl Invoice {
    pub fn compute(
        vehicle_label: &str,
        plate: &Plate,
        policy: &BillingPolicy,
        discount_rate: Decimal,
        days: u32,
        daily_rate: Money,
        apply_discount: bool,
    ) -> Self {
        let subtotal = daily_rate.multiply(Decimal::from(days));
        let discount = if apply_discount {
            subtotal.multiply(discount_rate)
        } else {
            Money::ZERO
        };
        let net = subtotal.subtract(discount);
        let tax = policy.tax_on(net);
        let total = net.add(tax);

        Self {
            vehicle_label: vehicle_label.to_string(),
            plate: plate.clone(),
            days,
            daily_rate,
            subtotal,
            discount,
            net,
            tax,
            total,
            tax_rate: policy.tax_rate,
        }
    }

    /// Human-readable invoice block.
    pub fn render(&self) -> String {
        let tax_percent = (self.tax_rate * dec!(100)).normalize();
        let mut out = String::new();
        let _ = writeln!(out, "=== RENTAL INVOICE ===");
        let _ = writeln!(out, "{} - Plate: {}", self.vehicle_label, self.plate);
        let _ = writeln!(out, "Rental days          : {}", self.days);
        let _ = writeln!(out, "Daily rate           : ${}", self.daily_rate);
        let _ = writeln!(out, "Subtotal             : ${}", self.subtotal);
        let _ = writeln!(out, "Discount applied     : ${}", self.discount);
        let _ = writeln!(out, "Net                  : ${}", self.net);
        let _ = writeln!(out, "Tax ({tax_percent}%)            : ${}", self.tax);
        let _ = writeln!(out, "TOTAL DUE            : ${}", self.total);
        out
    }
}

/// Invoice generation exposed by vehicle variants.
pub trait Billable {
    /// Label printed at the top of the invoice.
    fn billing_label(&self) -> &'static str;

    fn billing_plate(&self) -> &Plate;

    fn discount_rate(&self, policy: &BillingPolicy) -> Decimal;

    fn invoice(
        &self,
        policy: &BillingPolicy,
        days: u32,
        daily_rate: Money,
        apply_discount: bool,
    ) -> Invoice {
        Invoice::compute(
            self.billing_label(),
            self.billing_plate(),
            policy,
            self.discount_rate(policy),
            days,
            daily_rate,
            apply_discount,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate() -> Plate {
        Plate::new("BBCC11").unwrap()
    }

    #[test]
    fn test_passenger_without_discount() {
        let policy = BillingPolicy::default();
        let invoice = Invoice::compute(
            "Passenger vehicle",
            &plate(),
            &policy,
            policy.passenger_discount,
            2,
            Money::from_units(25_000),
            false,
        );

        assert_eq!(invoice.subtotal, Money::from_units(50_000));
        assert_eq!(invoice.discount, Money::ZERO);
        assert_eq!(invoice.tax, Money::from_units(9_500));
        assert_eq!(invoice.total, Money::from_units(59_500));
    }

    #[test]
    fn test_cargo_with_discount() {
        let policy = BillingPolicy::default();
        let invoice = Invoice::compute(
            "Cargo vehicle",
            &plate(),
            &policy,
            policy.cargo_discount,
            2,
            Money::from_units(25_000),
            true,
        );

        assert_eq!(invoice.discount, Money::from_units(3_500));
        assert_eq!(invoice.net, Money::from_units(46_500));
        assert_eq!(invoice.tax, Money::from_units(8_835));
        assert_eq!(invoice.total, Money::from_units(55_335));
    }

    #[test]
    fn test_rounding_only_on_render() {
        let policy = BillingPolicy::default();
        let invoice = Invoice::compute(
            "Passenger vehicle",
            &plate(),
            &policy,
            policy.passenger_discount,
            3,
            Money::from_decimal(dec!(10.333)),
            false,
        );

        assert_eq!(invoice.subtotal.as_decimal(), dec!(30.999));
        let text = invoice.render();
        assert!(text.contains("Subtotal             : $31.00"));
        assert!(text.contains("Tax (19%)"));
        assert!(text.contains("Plate: BBCC11"));
    }
}

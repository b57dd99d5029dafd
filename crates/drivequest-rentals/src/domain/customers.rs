use crate::domain::types::require_text;
use crate::error::{Entity, RentalError, Result};
use drivequest_common::ids;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub full_name: String,
    /// National ID (RUT) or passport number; the customer's unique key.
    pub national_id: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl Customer {
    /// Builds a validated customer. A blank `id` gets a fresh UUID.
    pub fn new(
        id: &str,
        full_name: &str,
        national_id: &str,
        phone: &str,
        email: &str,
        address: &str,
    ) -> Result<Self> {
        let id = match id.trim() {
            "" => ids::new_uuid(),
            given => given.to_string(),
        };
        Ok(Self {
            id,
            full_name: require_text("full name", full_name)?,
            national_id: require_text("national id", national_id)?,
            phone: require_text("phone", phone)?,
            email: require_text("email", email)?,
            address: require_text("address", address)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        Customer::new(
            &self.id,
            &self.full_name,
            &self.national_id,
            &self.phone,
            &self.email,
            &self.address,
        )
        .map(|_| ())
    }

    /// Case-insensitive match, including non-ASCII letters.
    pub fn has_national_id(&self, national_id: &str) -> bool {
        self.national_id.to_uppercase() == national_id.trim().to_uppercase()
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | ID: {} | Phone: {} | Email: {}",
            self.full_name, self.national_id, self.phone, self.email
        )
    }
}

/// Customer registry operations
pub trait CustomerOperations: Send + Sync {
    fn register(&self, customer: Customer) -> Result<()>;
    fn find(&self, national_id: &str) -> Option<Customer>;
    fn find_by_email(&self, email: &str) -> Option<Customer>;
    fn list(&self) -> Vec<Customer>;
    fn update(&self, customer: Customer) -> Result<()>;
    fn remove(&self, national_id: &str) -> bool;
}

pub struct CustomerRegistry {
    customers: RwLock<Vec<Customer>>,
}

impl CustomerRegistry {
    pub fn new() -> Self {
        Self {
            customers: RwLock::new(Vec::new()),
        }
    }

    /// Replaces the contents with previously persisted customers.
    ///
    /// Every record is validated and national ids must be unique; on failure
    /// the registry is left untouched.
    pub fn restore(&self, customers: Vec<Customer>) -> Result<()> {
        Self::check_restore(&customers)?;
        self.replace_all(customers);
        Ok(())
    }

    /// Applies the `register` rules to a persisted collection.
    pub fn check_restore(customers: &[Customer]) -> Result<()> {
        for (index, customer) in customers.iter().enumerate() {
            customer.validate()?;
            if customers[..index]
                .iter()
                .any(|c| c.has_national_id(&customer.national_id))
            {
                return Err(RentalError::duplicate(
                    Entity::Customer,
                    &customer.national_id,
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn replace_all(&self, customers: Vec<Customer>) {
        let mut guard = self.customers.write();
        *guard = customers;
        debug!("Restored {} customers", guard.len());
    }

    pub fn len(&self) -> usize {
        self.customers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.read().is_empty()
    }
}

impl Default for CustomerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomerOperations for CustomerRegistry {
    fn register(&self, customer: Customer) -> Result<()> {
        customer.validate()?;

        let mut customers = self.customers.write();
        if customers
            .iter()
            .any(|c| c.has_national_id(&customer.national_id))
        {
            return Err(RentalError::duplicate(
                Entity::Customer,
                customer.national_id,
            ));
        }

        info!("Registered customer {}", customer.national_id);
        customers.push(customer);
        Ok(())
    }

    fn find(&self, national_id: &str) -> Option<Customer> {
        self.customers
            .read()
            .iter()
            .find(|c| c.has_national_id(national_id))
            .cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<Customer> {
        self.customers
            .read()
            .iter()
            .find(|c| c.email.to_lowercase() == email.trim().to_lowercase())
            .cloned()
    }

    fn list(&self) -> Vec<Customer> {
        self.customers.read().clone()
    }

    fn update(&self, customer: Customer) -> Result<()> {
        customer.validate()?;

        let mut customers = self.customers.write();
        let existing = customers
            .iter_mut()
            .find(|c| c.has_national_id(&customer.national_id))
            .ok_or_else(|| RentalError::not_found(Entity::Customer, &customer.national_id))?;

        *existing = customer;
        Ok(())
    }

    fn remove(&self, national_id: &str) -> bool {
        let mut customers = self.customers.write();
        let before = customers.len();
        customers.retain(|c| !c.has_national_id(national_id));
        customers.len() != before
    }
}

use thiserror::Error;

/// Kind of entity a key or lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Customer,
    Vehicle,
    Reservation,
    Rental,
    Payment,
    Maintenance,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Entity::Customer => "customer",
            Entity::Vehicle => "vehicle",
            Entity::Reservation => "reservation",
            Entity::Rental => "rental",
            Entity::Payment => "payment",
            Entity::Maintenance => "maintenance record",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RentalError {
    #[error("A {entity} with key '{key}' already exists")]
    DuplicateKey { entity: Entity, key: String },

    #[error("Reservation '{code}' overlaps an existing booking for vehicle {plate}")]
    OverlappingBooking { code: String, plate: String },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid date range: end {end} must be after start {start}")]
    InvalidDateRange { start: String, end: String },

    #[error("No {entity} found for '{key}'")]
    NotFound { entity: Entity, key: String },

    #[error("Vehicle {plate} does not support invoicing")]
    NotBillable { plate: String },

    #[error("Vehicle {plate} is not available (status: {status})")]
    VehicleUnavailable { plate: String, status: String },

    #[error("Snapshot error in {file} line {line}: {reason}")]
    Snapshot {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] drivequest_common::ConfigurationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RentalError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RentalError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: Entity, key: impl Into<String>) -> Self {
        RentalError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn date_range(start: impl ToString, end: impl ToString) -> Self {
        RentalError::InvalidDateRange {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn duplicate(entity: Entity, key: impl Into<String>) -> Self {
        RentalError::DuplicateKey {
            entity,
            key: key.into(),
        }
    }

    /// True for business-rule rejections, false for infrastructure failures.
    pub fn is_domain_violation(&self) -> bool {
        !matches!(
            self,
            RentalError::Snapshot { .. }
                | RentalError::Config(_)
                | RentalError::Io(_)
                | RentalError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RentalError>;

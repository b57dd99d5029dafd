use crate::domain::{Invoice, Rental};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes one plain-text contract per rental.
#[derive(Debug, Clone)]
pub struct ContractWriter {
    dir: PathBuf,
}

impl ContractWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, rental_id: &str) -> PathBuf {
        self.dir.join(format!("contract_{rental_id}.txt"))
    }

    /// Creates the contract directory on demand.
    pub fn write(&self, rental: &Rental, invoice: &Invoice) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&rental.id);
        std::fs::write(&path, render_contract(rental, invoice))?;
        debug!("Wrote contract {}", path.display());
        Ok(path)
    }
}

pub fn render_contract(rental: &Rental, invoice: &Invoice) -> String {
    format!(
        "===== RENTAL CONTRACT =====\n\
         Customer: {} ({})\n\
         Vehicle: {}\n\
         Start: {} | End: {}\n\
         Mileage: {} km\n\
         Contract type: {}\n\n\
         {}",
        rental.customer.full_name,
        rental.customer.national_id,
        rental.vehicle.describe(),
        rental.start,
        rental.end,
        rental.mileage,
        rental.contract_type,
        invoice.render()
    )
}

pub mod contracts;
pub mod export;
pub mod snapshot;

pub use contracts::ContractWriter;
pub use export::export_reservations;
pub use snapshot::{SnapshotRecord, SnapshotStore};

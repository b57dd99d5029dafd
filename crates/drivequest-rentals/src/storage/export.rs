use crate::domain::Reservation;
use crate::error::Result;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

const HEADER: &str = "Customer,Vehicle,Start,End,FinalPrice";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Writes `reservations` as CSV to `path`, replacing any existing file.
/// Returns the number of data rows written.
pub fn export_reservations(reservations: &[Reservation], path: &Path) -> Result<usize> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        writeln!(writer, "{HEADER}")?;
        for reservation in reservations {
            writeln!(writer, "{}", csv_row(reservation))?;
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    info!(
        "Exported {} reservations to {}",
        reservations.len(),
        path.display()
    );
    Ok(reservations.len())
}

fn csv_row(reservation: &Reservation) -> String {
    let vehicle = format!(
        "{} {} ({})",
        reservation.vehicle.make,
        reservation.vehicle.model,
        reservation.vehicle.plate
    );
    [
        escape(&reservation.customer.full_name),
        escape(&vehicle),
        reservation.start.format(TIMESTAMP_FORMAT).to_string(),
        reservation.end.format(TIMESTAMP_FORMAT).to_string(),
        reservation.final_price().to_string(),
    ]
    .join(",")
}

fn escape(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("Soto, Luis"), "\"Soto, Luis\"");
        assert_eq!(escape("the \"big\" van"), "\"the \"\"big\"\" van\"");
    }
}

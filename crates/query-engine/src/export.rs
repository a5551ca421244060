//! CSV Export

use chrono::NaiveDate;
use std::fmt::Write;
use storage::{canonical_date, Reading};

use crate::FormatError;

/// Fixed export column order
pub const CSV_HEADER: [&str; 5] = ["ID", "Date", "Time", "Height (m)", "Flow (m³/s)"];

const LINE_END: &str = "\r\n";

/// Attachment name for a day's export, `data_YYYY-MM-DD.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("data_{}.csv", canonical_date(date))
}

/// Serialize readings as CSV with the date and time in separate columns.
///
/// Every stored timestamp must parse; a corrupt row aborts the export.
pub fn readings_to_csv(readings: &[Reading]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(64 * (readings.len() + 1));
    out.push_str(&CSV_HEADER.join(","));
    out.push_str(LINE_END);

    for reading in readings {
        let timestamp = reading
            .parsed_timestamp()
            .map_err(|_| FormatError::CorruptTimestamp {
                id: reading.id,
                timestamp: reading.timestamp.clone(),
            })?;

        // Writing into a String cannot fail
        let _ = write!(
            out,
            "{},{},{},{},{}{}",
            reading.id,
            timestamp.display_date(),
            timestamp.display_time(),
            reading.height,
            reading.flow,
            LINE_END
        );
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(id: i64, timestamp: &str, height: f64, flow: f64) -> Reading {
        Reading {
            id,
            timestamp: timestamp.to_string(),
            height,
            flow,
        }
    }

    #[test]
    fn test_header_only_when_empty() {
        let csv = readings_to_csv(&[]).unwrap();
        assert_eq!(csv, "ID,Date,Time,Height (m),Flow (m³/s)\r\n");
    }

    #[test]
    fn test_rows_split_date_and_time() {
        let rows = [
            reading(3, "2024-03-01 18:00:00", 3.5, 12.25),
            reading(2, "2024-03-01 09:15:30", 2.0, 8.5),
            reading(1, "2024-03-01 00:00:01", 1.75, 5.0),
        ];
        let csv = readings_to_csv(&rows).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "ID,Date,Time,Height (m),Flow (m³/s)");
        assert_eq!(lines[1], "3,01/03/2024,18:00:00,3.5,12.25");
        assert_eq!(lines[2], "2,01/03/2024,09:15:30,2,8.5");
        assert_eq!(lines[3], "1,01/03/2024,00:00:01,1.75,5");
    }

    #[test]
    fn test_corrupt_row_fails_export() {
        let rows = [
            reading(1, "2024-03-01 00:00:01", 1.0, 5.0),
            reading(2, "01/03/2024 00:00:02", 1.0, 5.0),
        ];
        let err = readings_to_csv(&rows).unwrap_err();
        assert!(matches!(err, FormatError::CorruptTimestamp { id: 2, .. }));
    }

    #[test]
    fn test_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(export_filename(date), "data_2024-03-01.csv");
    }
}

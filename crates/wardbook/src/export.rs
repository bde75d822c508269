//! CSV export of the staff roster.

use std::io::Write;

use chrono::{DateTime, TimeZone};
use tracing::info;

use crate::error::Result;
use crate::records::Staff;
use crate::storage::Storage;

/// Header row of the staff export.
pub const CSV_HEADER: [&str; 8] = [
    "Hospital No",
    "Full Name",
    "DOB",
    "Gender",
    "Telephone",
    "Force/File No",
    "Station",
    "Rank",
];

/// Download name for an export taken at `now`.
#[must_use]
pub fn export_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("export_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write every staff record as CSV, header first.
///
/// Returns the number of staff rows written.
///
/// # Errors
///
/// Returns an error if the database read or the write fails.
pub fn write_staff_csv<W: Write>(storage: &Storage, out: &mut W) -> Result<usize> {
    write_row(out, &CSV_HEADER)?;

    let mut rows = 0;
    storage.for_each_staff(|staff| {
        write_row(out, &staff_fields(staff))?;
        rows += 1;
        Ok(())
    })?;

    info!("Exported {} staff records", rows);
    Ok(rows)
}

/// Render the staff export into a string.
///
/// # Errors
///
/// Returns an error if the database read fails.
pub fn staff_csv(storage: &Storage) -> Result<String> {
    let mut buf = Vec::new();
    write_staff_csv(storage, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn staff_fields(staff: &Staff) -> [&str; 8] {
    [
        staff.hospital_number.as_str(),
        staff.full_name.as_str(),
        staff.dob.as_str(),
        staff.gender.as_str(),
        staff.telephone.as_str(),
        staff.force_file_number.as_str(),
        staff.station.as_str(),
        staff.rank.as_str(),
    ]
}

fn write_row<W: Write>(out: &mut W, fields: &[&str]) -> Result<()> {
    let line = fields
        .iter()
        .map(|field| escape_csv(field))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}")?;
    Ok(())
}

fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::storage::test_support::*;

    #[test]
    fn test_empty_export_is_header_only() {
        let storage = create_test_storage();
        let csv = staff_csv(&storage).unwrap();
        assert_eq!(
            csv,
            "Hospital No,Full Name,DOB,Gender,Telephone,Force/File No,Station,Rank\n"
        );
    }

    #[test]
    fn test_one_row_per_staff_in_column_order() {
        let storage = create_test_storage();
        register(&storage, "HN-1", "Ada Obi");
        register(&storage, "HN-2", "Bayo Ade");
        register(&storage, "HN-1", "Ada Obi");

        let mut out = Vec::new();
        let rows = write_staff_csv(&storage, &mut out).unwrap();
        assert_eq!(rows, 2);

        let csv = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "HN-1,Ada Obi,1984-06-02,Female,0803 555 0101,FF/2231,Kirikiri,Inspector"
        );
        assert!(lines[2].starts_with("HN-2,Bayo Ade,"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let storage = create_test_storage();
        let mut staff = new_staff("HN-3", "Obi, Ada \"Nne\"");
        staff.station = "Ward 3\nAnnex".to_string();
        storage.upsert_staff(&staff).unwrap();

        let csv = staff_csv(&storage).unwrap();
        assert!(csv.contains("\"Obi, Ada \"\"Nne\"\"\""));
        assert!(csv.contains("\"Ward 3\nAnnex\""));
    }

    #[test]
    fn test_escape_csv_plain() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv(""), "");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
    }

    #[test]
    fn test_export_file_name() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap()
            .and_utc();
        assert_eq!(export_file_name(&at), "export_20240309_140507.csv");
        assert!(export_file_name(&Utc::now()).starts_with("export_"));
    }
}

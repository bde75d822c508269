//! Visit logging and history.

use chrono::NaiveDate;
use rusqlite::params;
use tracing::{debug, warn};

use super::staff::staff_exists_on;
use super::{now_timestamp, parse_timestamp, Storage};
use crate::error::{Error, Result};
use crate::records::{NewVisit, Outcome, Visit};

const VISIT_DATE_FORMAT: &str = "%Y-%m-%d";

impl Storage {
    /// Log a visit against a staff record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaffNotFound`] if the staff record does not exist,
    /// or an error if the database operation fails.
    pub fn log_visit(&self, staff_id: i64, visit: &NewVisit) -> Result<i64> {
        if !staff_exists_on(&self.conn, staff_id)? {
            return Err(Error::staff_not_found(format!("id {staff_id}")));
        }

        self.conn.execute(
            r"
            INSERT INTO visits (
                staff_id, visit_date, reason, patient_condition, visit_type,
                admitted, admission_date, outcome, referral_destination,
                discharge_date, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
            params![
                staff_id,
                visit.visit_date.format(VISIT_DATE_FORMAT).to_string(),
                visit.reason,
                visit.condition,
                visit.visit_type,
                visit.admitted,
                visit.admission_date,
                visit.outcome.as_ref().map(Outcome::as_str),
                visit.referral_destination,
                visit.discharge_date,
                visit.notes,
                now_timestamp(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(
            "Logged visit {} for staff {} on {}",
            id, staff_id, visit.visit_date
        );
        Ok(id)
    }

    /// List a staff record's visits, newest visit date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_visits(&self, staff_id: i64) -> Result<Vec<Visit>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, staff_id, visit_date, reason, patient_condition, visit_type,
                   admitted, admission_date, outcome, referral_destination,
                   discharge_date, notes, created_at
            FROM visits
            WHERE staff_id = ?1
            ORDER BY visit_date DESC, id DESC
            ",
        )?;

        let visits = stmt
            .query_map([staff_id], Self::row_to_visit)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(visits)
    }

    /// Convert a database row to a Visit struct.
    fn row_to_visit(row: &rusqlite::Row) -> rusqlite::Result<Visit> {
        let visit_date: String = row.get(2)?;
        let outcome: Option<String> = row.get(8)?;
        let created_at: String = row.get(12)?;

        let visit_date = NaiveDate::parse_from_str(&visit_date, VISIT_DATE_FORMAT)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

        let outcome = outcome.and_then(|label| {
            label
                .parse::<Outcome>()
                .inspect_err(|_| warn!("Ignoring unknown stored outcome: {}", label))
                .ok()
        });

        Ok(Visit {
            id: row.get(0)?,
            staff_id: row.get(1)?,
            visit_date,
            reason: row.get(3)?,
            condition: row.get(4)?,
            visit_type: row.get(5)?,
            admitted: row.get(6)?,
            admission_date: row.get(7)?,
            outcome,
            referral_destination: row.get(9)?,
            discharge_date: row.get(10)?,
            notes: row.get(11)?,
            created_at: parse_timestamp(&created_at),
        })
    }
}

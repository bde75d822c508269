//! Staff registration, lookup and search.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::{now_timestamp, parse_timestamp, Storage};
use crate::error::Result;
use crate::records::{NewStaff, Staff, StaffKey, StaffSummary};

const STAFF_COLUMNS: &str = r"
    id, hospital_number, full_name, dob, gender, telephone,
    force_file_number, station, rank, photo, created_at, updated_at
";

impl Storage {
    /// Register a staff record, or overwrite the one with the same
    /// hospital number.
    ///
    /// Re-registration keeps the row id, `created_at`, and the stored photo
    /// when no new photo accompanies it. Every other field takes the new
    /// value. Returns the row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is invalid or the database operation fails.
    pub fn upsert_staff(&self, staff: &NewStaff) -> Result<i64> {
        staff.validate()?;
        let now = now_timestamp();

        let id: i64 = self.conn.query_row(
            r"
            INSERT INTO staff (
                hospital_number, full_name, dob, gender, telephone,
                force_file_number, station, rank, photo, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT(hospital_number) DO UPDATE SET
                full_name = excluded.full_name,
                dob = excluded.dob,
                gender = excluded.gender,
                telephone = excluded.telephone,
                force_file_number = excluded.force_file_number,
                station = excluded.station,
                rank = excluded.rank,
                photo = COALESCE(excluded.photo, staff.photo),
                updated_at = excluded.updated_at
            RETURNING id
            ",
            params![
                staff.hospital_number.trim(),
                staff.full_name.trim(),
                staff.dob,
                staff.gender,
                staff.telephone,
                staff.force_file_number,
                staff.station,
                staff.rank,
                staff.photo,
                now,
            ],
            |row| row.get(0),
        )?;

        info!(
            "Registered staff {} (id {})",
            staff.hospital_number.trim(),
            id
        );
        Ok(id)
    }

    /// Get a staff record by its row id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_staff(&self, id: i64) -> Result<Option<Staff>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = ?1");
        let staff = self
            .conn
            .query_row(&sql, [id], Self::row_to_staff)
            .optional()?;
        Ok(staff)
    }

    /// Get a staff record by hospital number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_staff_by_hospital_number(&self, hospital_number: &str) -> Result<Option<Staff>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE hospital_number = ?1");
        let staff = self
            .conn
            .query_row(&sql, [hospital_number.trim()], Self::row_to_staff)
            .optional()?;
        Ok(staff)
    }

    /// Get a staff record by either key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_staff(&self, key: &StaffKey) -> Result<Option<Staff>> {
        match key {
            StaffKey::Id(id) => self.get_staff(*id),
            StaffKey::HospitalNumber(number) => self.get_staff_by_hospital_number(number),
        }
    }

    /// Check whether a staff record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn staff_exists(&self, id: i64) -> Result<bool> {
        staff_exists_on(&self.conn, id)
    }

    /// Count staff records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_staff(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM staff", [], |row| row.get(0))?;
        Ok(count)
    }

    /// List staff for the home page.
    ///
    /// A blank term lists everyone; otherwise a staff record matches when its
    /// hospital number, full name, station, force/file number or rank
    /// contains the term, ignoring ASCII case. Newest registrations first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn search_staff(&self, term: &str) -> Result<Vec<StaffSummary>> {
        let term = term.trim();

        let rows = if term.is_empty() {
            let mut stmt = self.conn.prepare(
                r"
                SELECT id, hospital_number, full_name, station, rank
                FROM staff ORDER BY created_at DESC, id DESC
                ",
            )?;
            let rows = stmt
                .query_map([], Self::row_to_summary)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let pattern = like_pattern(term);
            let mut stmt = self.conn.prepare(
                r"
                SELECT id, hospital_number, full_name, station, rank
                FROM staff
                WHERE hospital_number LIKE ?1 ESCAPE '\'
                   OR full_name LIKE ?1 ESCAPE '\'
                   OR station LIKE ?1 ESCAPE '\'
                   OR force_file_number LIKE ?1 ESCAPE '\'
                   OR rank LIKE ?1 ESCAPE '\'
                ORDER BY created_at DESC, id DESC
                ",
            )?;
            let rows = stmt
                .query_map([pattern], Self::row_to_summary)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        debug!("Staff search '{}' matched {} records", term, rows.len());
        Ok(rows)
    }

    /// Visit every staff record in registration order.
    ///
    /// Rows are handed to `visit` as they are read rather than collected.
    ///
    /// # Errors
    ///
    /// Returns the first error from the database or from `visit`.
    pub fn for_each_staff<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(&Staff) -> Result<()>,
    {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let staff = Self::row_to_staff(row)?;
            visit(&staff)?;
        }
        Ok(())
    }

    /// Convert a database row to a Staff struct.
    fn row_to_staff(row: &rusqlite::Row) -> rusqlite::Result<Staff> {
        let created_at: String = row.get(10)?;
        let updated_at: String = row.get(11)?;

        Ok(Staff {
            id: row.get(0)?,
            hospital_number: row.get(1)?,
            full_name: row.get(2)?,
            dob: row.get(3)?,
            gender: row.get(4)?,
            telephone: row.get(5)?,
            force_file_number: row.get(6)?,
            station: row.get(7)?,
            rank: row.get(8)?,
            photo: row.get(9)?,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }

    fn row_to_summary(row: &rusqlite::Row) -> rusqlite::Result<StaffSummary> {
        Ok(StaffSummary {
            id: row.get(0)?,
            hospital_number: row.get(1)?,
            full_name: row.get(2)?,
            station: row.get(3)?,
            rank: row.get(4)?,
        })
    }
}

/// Existence check usable inside an open transaction.
pub(super) fn staff_exists_on(conn: &Connection, id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM staff WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Wrap a search term for a substring `LIKE` match, escaping wildcards.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

//! Dependants and the per-staff cap.

use rusqlite::{params, TransactionBehavior};
use tracing::{debug, info};

use super::staff::staff_exists_on;
use super::Storage;
use crate::error::{Error, Result};
use crate::records::{Dependant, DependantAdded, NewDependant, MAX_DEPENDANTS};

impl Storage {
    /// Add a dependant to a staff record unless it already owns
    /// [`MAX_DEPENDANTS`].
    ///
    /// The count and the insert run in one write transaction that takes the
    /// database lock up front, so concurrent requests against the same staff
    /// record can never push it past the cap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StaffNotFound`] if the staff record does not exist,
    /// or an error if the database operation fails.
    pub fn add_dependant(
        &mut self,
        staff_id: i64,
        dependant: &NewDependant,
    ) -> Result<DependantAdded> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !staff_exists_on(&tx, staff_id)? {
            return Err(Error::staff_not_found(format!("id {staff_id}")));
        }

        let inserted = tx.execute(
            r"
            INSERT INTO dependants (staff_id, name, dob, relation, photo)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE (SELECT COUNT(*) FROM dependants WHERE staff_id = ?1) < ?6
            ",
            params![
                staff_id,
                dependant.name.trim(),
                dependant.dob,
                dependant.relation,
                dependant.photo,
                MAX_DEPENDANTS,
            ],
        )?;

        if inserted == 0 {
            tx.rollback()?;
            info!(
                "Dependant limit of {} reached for staff {}",
                MAX_DEPENDANTS, staff_id
            );
            return Ok(DependantAdded::LimitReached);
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!("Added dependant {} to staff {}", id, staff_id);
        Ok(DependantAdded::Added(id))
    }

    /// List a staff record's dependants in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_dependants(&self, staff_id: i64) -> Result<Vec<Dependant>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, staff_id, name, dob, relation, photo
            FROM dependants WHERE staff_id = ?1 ORDER BY id
            ",
        )?;

        let dependants = stmt
            .query_map([staff_id], |row| {
                Ok(Dependant {
                    id: row.get(0)?,
                    staff_id: row.get(1)?,
                    name: row.get(2)?,
                    dob: row.get(3)?,
                    relation: row.get(4)?,
                    photo: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(dependants)
    }

    /// Count a staff record's dependants.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count_dependants(&self, staff_id: i64) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM dependants WHERE staff_id = ?1",
            [staff_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

//! Dashboard totals.

use serde::Serialize;

use super::Storage;
use crate::error::Result;
use crate::records::Outcome;

/// Headline counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Registered staff records.
    pub total_staff: i64,
    /// Logged visits.
    pub total_visits: i64,
    /// Visits flagged as admitted.
    pub admissions: i64,
    /// Visits with outcome Died.
    pub deaths: i64,
    /// Visits that ended in discharge, counting recoveries.
    pub discharged: i64,
    /// Visits with outcome Referred.
    pub referred: i64,
}

impl Storage {
    /// Compute the dashboard totals in one consistent read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn statistics(&self) -> Result<Statistics> {
        let stats = self.conn.query_row(
            r"
            SELECT
                (SELECT COUNT(*) FROM staff),
                COUNT(*),
                COALESCE(SUM(admitted), 0),
                COALESCE(SUM(outcome = ?1), 0),
                COALESCE(SUM(outcome IN (?2, ?4)), 0),
                COALESCE(SUM(outcome = ?3), 0)
            FROM visits
            ",
            [
                Outcome::Died.as_str(),
                Outcome::Discharged.as_str(),
                Outcome::Referred.as_str(),
                Outcome::Recovered.as_str(),
            ],
            |row| {
                Ok(Statistics {
                    total_staff: row.get(0)?,
                    total_visits: row.get(1)?,
                    admissions: row.get(2)?,
                    deaths: row.get(3)?,
                    discharged: row.get(4)?,
                    referred: row.get(5)?,
                })
            },
        )?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NewVisit;
    use crate::storage::test_support::*;

    #[test]
    fn test_empty_database_is_all_zero() {
        let storage = create_test_storage();
        assert_eq!(storage.statistics().unwrap(), Statistics::default());
    }

    #[test]
    fn test_counts_by_outcome() {
        let storage = create_test_storage();
        let a = register(&storage, "HN-1", "Ada Obi");
        let b = register(&storage, "HN-2", "Bayo Ade");

        let outcomes = [
            Some(Outcome::Died),
            Some(Outcome::Died),
            Some(Outcome::Discharged),
            Some(Outcome::Referred),
            Some(Outcome::Recovered),
            None,
        ];
        for (n, outcome) in outcomes.into_iter().enumerate() {
            let owner = if n % 2 == 0 { a } else { b };
            let visit = NewVisit {
                outcome,
                admitted: n < 2,
                ..visit()
            };
            storage.log_visit(owner, &visit).unwrap();
        }

        let stats = storage.statistics().unwrap();
        assert_eq!(
            stats,
            Statistics {
                total_staff: 2,
                total_visits: 6,
                admissions: 2,
                deaths: 2,
                discharged: 2,
                referred: 1,
            }
        );
    }

    #[test]
    fn test_staff_without_visits_still_counted() {
        let storage = create_test_storage();
        register(&storage, "HN-1", "Ada Obi");

        let stats = storage.statistics().unwrap();
        assert_eq!(stats.total_staff, 1);
        assert_eq!(stats.total_visits, 0);
        assert_eq!(stats.admissions, 0);
    }

    #[test]
    fn test_reregistration_does_not_inflate_total() {
        let storage = create_test_storage();
        register(&storage, "HN-1", "Ada Obi");
        register(&storage, "HN-1", "Ada Obi");
        assert_eq!(storage.statistics().unwrap().total_staff, 1);
    }

    #[test]
    fn test_serializes_to_json() {
        let stats = Statistics {
            total_staff: 3,
            ..Statistics::default()
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["total_staff"], 3);
        assert_eq!(json["deaths"], 0);
    }
}

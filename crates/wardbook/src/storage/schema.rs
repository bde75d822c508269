//! `SQLite` schema definitions for wardbook.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the staff table.
///
/// `created_at` is written once; `updated_at` moves on every registration.
pub const CREATE_STAFF_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS staff (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hospital_number TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    dob TEXT NOT NULL DEFAULT '',
    gender TEXT NOT NULL DEFAULT '',
    telephone TEXT NOT NULL DEFAULT '',
    force_file_number TEXT NOT NULL DEFAULT '',
    station TEXT NOT NULL DEFAULT '',
    rank TEXT NOT NULL DEFAULT '',
    photo TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
";

/// SQL statement to create the dependants table.
pub const CREATE_DEPENDANTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS dependants (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    staff_id INTEGER NOT NULL REFERENCES staff(id),
    name TEXT NOT NULL,
    dob TEXT NOT NULL DEFAULT '',
    relation TEXT NOT NULL DEFAULT '',
    photo TEXT
)
";

/// SQL statement to create the visits table.
pub const CREATE_VISITS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    staff_id INTEGER NOT NULL REFERENCES staff(id),
    visit_date TEXT NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    patient_condition TEXT NOT NULL DEFAULT '',
    visit_type TEXT NOT NULL DEFAULT '',
    admitted INTEGER NOT NULL DEFAULT 0,
    admission_date TEXT,
    outcome TEXT CHECK (outcome IN ('Recovered', 'Discharged', 'Died', 'Referred')),
    referral_destination TEXT,
    discharge_date TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on staff creation time for the listing.
pub const CREATE_STAFF_CREATED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_staff_created_at ON staff(created_at DESC)
";

/// SQL statement to create an index on `staff_id` for dependant lookups.
pub const CREATE_DEPENDANTS_STAFF_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_dependants_staff ON dependants(staff_id)
";

/// SQL statement to create an index for a staff member's visit history.
pub const CREATE_VISITS_STAFF_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_visits_staff_date ON visits(staff_id, visit_date DESC)
";

/// SQL statement to create an index on outcome for dashboard counts.
pub const CREATE_VISITS_OUTCOME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_visits_outcome ON visits(outcome)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_STAFF_TABLE,
    CREATE_DEPENDANTS_TABLE,
    CREATE_VISITS_TABLE,
    CREATE_STAFF_CREATED_INDEX,
    CREATE_DEPENDANTS_STAFF_INDEX,
    CREATE_VISITS_STAFF_DATE_INDEX,
    CREATE_VISITS_OUTCOME_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_staff_table_natural_key() {
        assert!(CREATE_STAFF_TABLE.contains("hospital_number TEXT NOT NULL UNIQUE"));
        assert!(CREATE_STAFF_TABLE.contains("created_at TEXT NOT NULL"));
        assert!(CREATE_STAFF_TABLE.contains("updated_at TEXT NOT NULL"));
    }

    #[test]
    fn test_child_tables_reference_staff() {
        assert!(CREATE_DEPENDANTS_TABLE.contains("REFERENCES staff(id)"));
        assert!(CREATE_VISITS_TABLE.contains("REFERENCES staff(id)"));
    }

    #[test]
    fn test_visits_outcome_is_constrained() {
        assert!(CREATE_VISITS_TABLE.contains("CHECK (outcome IN"));
    }
}

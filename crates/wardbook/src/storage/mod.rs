//! Storage layer for wardbook.
//!
//! This module provides `SQLite`-based persistent storage for staff,
//! dependants and visits. Every read goes back to the database; nothing is
//! cached in the process.

pub mod migrations;
pub mod schema;

mod dependants;
mod staff;
mod stats;
mod visits;

pub use stats::Statistics;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::records::{StaffDetail, StaffKey};

/// How long a connection waits on a competing writer unless configured.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Storage engine for clinic records.
///
/// Opened once at process start and handed to every operation that needs
/// it; dropping it closes the connection.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open or create a storage database with an explicit busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open_with_timeout(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a staff record together with its dependants and visits.
    ///
    /// Returns `None` when no staff record matches the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn staff_detail(&self, key: &StaffKey) -> Result<Option<StaffDetail>> {
        let Some(staff) = self.find_staff(key)? else {
            debug!("No staff record for {}", key);
            return Ok(None);
        };

        let dependants = self.list_dependants(staff.id)?;
        let visits = self.list_visits(staff.id)?;
        Ok(Some(StaffDetail {
            staff,
            dependants,
            visits,
        }))
    }
}

/// The current time in the format every timestamp column uses.
///
/// Fixed-width microsecond precision keeps lexical and chronological
/// ordering identical.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to the epoch for malformed values.
pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value).map_or_else(
        |_| {
            warn!("Malformed stored timestamp: {}", value);
            DateTime::<Utc>::UNIX_EPOCH
        },
        |dt| dt.with_timezone(&Utc),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Storage;
    use crate::records::{NewStaff, NewVisit};

    pub fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    pub fn new_staff(hospital_number: &str, full_name: &str) -> NewStaff {
        NewStaff {
            hospital_number: hospital_number.to_string(),
            full_name: full_name.to_string(),
            dob: "1984-06-02".to_string(),
            gender: "Female".to_string(),
            telephone: "0803 555 0101".to_string(),
            force_file_number: "FF/2231".to_string(),
            station: "Kirikiri".to_string(),
            rank: "Inspector".to_string(),
            photo: None,
        }
    }

    pub fn register(storage: &Storage, hospital_number: &str, full_name: &str) -> i64 {
        storage
            .upsert_staff(&new_staff(hospital_number, full_name))
            .expect("failed to register staff")
    }

    pub fn visit() -> NewVisit {
        NewVisit {
            reason: "Fever".to_string(),
            condition: "stable".to_string(),
            visit_type: "Exam".to_string(),
            ..NewVisit::today()
        }
    }
}

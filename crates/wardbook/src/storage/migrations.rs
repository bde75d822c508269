//! Schema versioning.
//!
//! The applied version lives in the `metadata` table. Each step in
//! [`MIGRATIONS`] moves the schema forward by one version; all pending steps
//! run inside one transaction so a failed upgrade leaves the database as it
//! was.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

use super::schema::{CREATE_METADATA_TABLE, SCHEMA_STATEMENTS};

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 1;

const VERSION_KEY: &str = "schema_version";

/// One forward step of the schema.
struct Migration {
    version: i32,
    description: &'static str,
    apply: fn(&Connection) -> Result<()>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "staff, dependants and visits",
    apply: create_base_schema,
}];

fn create_base_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

/// Bring the schema up to [`CURRENT_VERSION`].
///
/// A fresh database gets every step; an up-to-date one is left alone.
///
/// # Errors
///
/// Returns an error if a step fails, or if the database was written by a
/// newer version of wardbook.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(CREATE_METADATA_TABLE, [])?;

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    let mut pending = MIGRATIONS.iter().filter(|m| m.version > version).peekable();
    if pending.peek().is_none() {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    for migration in pending {
        info!(
            "Applying schema version {}: {}",
            migration.version, migration.description
        );
        (migration.apply)(&tx)?;
    }
    set_schema_version(&tx, CURRENT_VERSION)?;
    tx.commit()?;
    Ok(())
}

/// The applied version; 0 for a database that has never been initialized.
fn schema_version(conn: &Connection) -> Result<i32> {
    let stored = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get::<_, String>(0),
    );

    match stored {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

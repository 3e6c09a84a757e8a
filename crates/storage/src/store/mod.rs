#![forbid(unsafe_code)]

mod error;
mod order;
mod reposition;
mod requests;

pub use error::StoreError;
pub use requests::*;

use cl_core::model::Entry;
use cl_core::names::EntryName;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, TransactionBehavior, params};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA_VERSION: i64 = 1;
const DB_FILE: &str = "chainlist.db";

/// The entry store plus the consistency engine on top of it. Every public
/// operation is a single transaction; no chain state is cached between calls.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        preflight_gate(&conn)?;
        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn add_entry(&mut self, request: AddEntryRequest) -> Result<Entry, StoreError> {
        let name = canonicalize_name(&request.name)?;
        let prev = request.prev.as_deref().map(canonicalize_name).transpose()?;
        let next = request.next.as_deref().map(canonicalize_name).transpose()?;

        let now_ms = now_ms();
        let tx = self.write_tx()?;

        if entry_by_name_tx(&tx, &name)?.is_some() {
            return Err(StoreError::NameTaken { name });
        }

        let prev_row = match prev.as_deref() {
            Some(prev_name) => Some(require_entry_by_name_tx(&tx, prev_name)?),
            None => None,
        };

        if let Some(next_name) = next.as_deref() {
            require_entry_by_name_tx(&tx, next_name)?;
            match &prev_row {
                Some(prev_row) => {
                    // Splicing strictly between two entries requires them to
                    // be adjacent right now.
                    if prev_row.next.as_deref() != Some(next_name) {
                        return Err(StoreError::NotAdjacent {
                            prev: prev_row.name.clone(),
                            next: next_name.to_string(),
                        });
                    }
                }
                None => {
                    if let Some(holder) = predecessor_tx(&tx, next_name)? {
                        return Err(StoreError::NextTaken {
                            next: next_name.to_string(),
                            holder: holder.name,
                        });
                    }
                }
            }
        } else if let Some(prev_row) = &prev_row {
            // Appending after prev is only unambiguous when prev is the tail.
            if let Some(successor) = prev_row.next.clone() {
                return Err(StoreError::TailOccupied {
                    prev: prev_row.name.clone(),
                    successor,
                });
            }
        }

        // Patch the predecessor first: it may currently hold the `next` value
        // the new row is about to take, and the unique index on `next` is
        // enforced per statement.
        if let Some(prev_row) = &prev_row {
            tx.execute(
                "UPDATE entries SET next = ?2, updated_at_ms = ?3 WHERE id = ?1",
                params![prev_row.id, name, now_ms],
            )
            .map_err(map_corrupt)?;
        }
        tx.execute(
            "INSERT INTO entries(name, next, created_at_ms, updated_at_ms) VALUES (?1, ?2, ?3, ?3)",
            params![name, next, now_ms],
        )
        .map_err(map_corrupt)?;
        let id = tx.last_insert_rowid();

        tx.commit().map_err(map_corrupt)?;
        Ok(Entry {
            id,
            name,
            next,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        })
    }

    /// Removes the entry and splices its predecessor over the gap. Returns a
    /// snapshot of the removed row.
    pub fn remove_entry(&mut self, id: i64) -> Result<Entry, StoreError> {
        let now_ms = now_ms();
        let tx = self.write_tx()?;

        let Some(entry) = entry_by_id_tx(&tx, id)? else {
            return Err(StoreError::UnknownId { id });
        };
        let predecessor = predecessor_tx(&tx, &entry.name)?;

        // Delete first: the removed row still holds the `next` value its
        // predecessor is about to take over.
        tx.execute("DELETE FROM entries WHERE id = ?1", params![id])
            .map_err(map_corrupt)?;
        if let Some(pred) = predecessor {
            tx.execute(
                "UPDATE entries SET next = ?2, updated_at_ms = ?3 WHERE id = ?1",
                params![pred.id, entry.next, now_ms],
            )
            .map_err(map_corrupt)?;
        }

        tx.commit().map_err(map_corrupt)?;
        Ok(entry)
    }

    pub fn rename_entry(&mut self, id: i64, new_name: &str) -> Result<Entry, StoreError> {
        let new_name = canonicalize_name(new_name)?;

        let now_ms = now_ms();
        let tx = self.write_tx()?;

        let Some(entry) = entry_by_id_tx(&tx, id)? else {
            return Err(StoreError::UnknownId { id });
        };
        if entry.name == new_name {
            return Ok(entry);
        }
        if entry_by_name_tx(&tx, &new_name)?.is_some() {
            return Err(StoreError::NameTaken { name: new_name });
        }

        let renamed = rename_tx(&tx, &entry, &new_name, now_ms)?;
        tx.commit().map_err(map_corrupt)?;
        Ok(renamed)
    }

    pub fn get_entry(&self, id: i64) -> Result<Option<Entry>, StoreError> {
        entry_by_id_tx(&self.conn, id)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Mutations take the write lock up front so a neighbor read inside the
    /// transaction cannot be invalidated by a concurrent writer before the
    /// matching patch lands.
    pub(crate) fn write_tx(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

/// Shared rename step: patch the predecessor's pointer and the row itself in
/// the same transaction. The predecessor briefly points at a name that does
/// not exist yet; the foreign key on `next` is deferred to commit for exactly
/// this window.
pub(crate) fn rename_tx(
    tx: &Transaction<'_>,
    entry: &Entry,
    new_name: &str,
    now_ms: i64,
) -> Result<Entry, StoreError> {
    if let Some(pred) = predecessor_tx(tx, &entry.name)? {
        tx.execute(
            "UPDATE entries SET next = ?2, updated_at_ms = ?3 WHERE id = ?1",
            params![pred.id, new_name, now_ms],
        )
        .map_err(map_corrupt)?;
    }
    tx.execute(
        "UPDATE entries SET name = ?2, updated_at_ms = ?3 WHERE id = ?1",
        params![entry.id, new_name, now_ms],
    )
    .map_err(map_corrupt)?;

    Ok(Entry {
        id: entry.id,
        name: new_name.to_string(),
        next: entry.next.clone(),
        created_at_ms: entry.created_at_ms,
        updated_at_ms: now_ms,
    })
}

fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }

    if tables.is_empty() {
        return Ok(());
    }

    let required: BTreeSet<&str> = ["meta", "entries"].into_iter().collect();

    if tables.iter().any(|table| !required.contains(table.as_str())) {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: unsupported tables detected",
        ));
    }
    for table in required {
        if !tables.contains(table) {
            return Err(StoreError::InvalidInput(
                "RESET_REQUIRED: required table is missing",
            ));
        }
    }

    let version = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    match version.as_deref().map(str::parse::<i64>) {
        Some(Ok(v)) if v == SCHEMA_VERSION => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema state row is missing",
        )),
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS entries (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL UNIQUE,
          next TEXT UNIQUE
            REFERENCES entries(name)
            DEFERRABLE INITIALLY DEFERRED,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          CHECK(next IS NULL OR next <> name)
        );
        "#,
    )?;

    conn.execute(
        "INSERT INTO meta(key, value) VALUES ('schema_version', ?1) \
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

fn read_entry_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        name: row.get(1)?,
        next: row.get(2)?,
        created_at_ms: row.get(3)?,
        updated_at_ms: row.get(4)?,
    })
}

pub(crate) fn entry_by_id_tx(conn: &Connection, id: i64) -> Result<Option<Entry>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT id, name, next, created_at_ms, updated_at_ms FROM entries WHERE id = ?1",
            params![id],
            read_entry_row,
        )
        .optional()?)
}

pub(crate) fn entry_by_name_tx(conn: &Connection, name: &str) -> Result<Option<Entry>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT id, name, next, created_at_ms, updated_at_ms FROM entries WHERE name = ?1",
            params![name],
            read_entry_row,
        )
        .optional()?)
}

pub(crate) fn require_entry_by_name_tx(conn: &Connection, name: &str) -> Result<Entry, StoreError> {
    entry_by_name_tx(conn, name)?.ok_or_else(|| StoreError::UnknownName {
        name: name.to_string(),
    })
}

/// The entry whose `next` equals `name`; zero or one by the unique index.
pub(crate) fn predecessor_tx(conn: &Connection, name: &str) -> Result<Option<Entry>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT id, name, next, created_at_ms, updated_at_ms FROM entries WHERE next = ?1",
            params![name],
            read_entry_row,
        )
        .optional()?)
}

pub(crate) fn canonicalize_name(value: &str) -> Result<String, StoreError> {
    EntryName::try_new(value)
        .map(EntryName::into_string)
        .map_err(|_| StoreError::InvalidInput("invalid entry name"))
}

/// A constraint violation on a write that already passed validation means the
/// stored chain disagrees with what validation saw. Never repaired silently.
pub(crate) fn map_corrupt(err: rusqlite::Error) -> StoreError {
    if is_constraint_violation(&err) {
        return StoreError::CorruptChain("constraint rejected a write that passed validation");
    }
    err.into()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("FOREIGN KEY constraint failed")
                })
        }
        _ => false,
    }
}

pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError, entry_by_id_tx, predecessor_tx, requests::OrderQuery};
use cl_core::model::{Direction, Entry};
use cl_core::query::{MAX_LIMIT, MIN_LIMIT};
use rusqlite::{Connection, OptionalExtension};

impl SqliteStore {
    /// Materializes a bounded, oriented view of the chain.
    ///
    /// Only the forward pointer is persisted, so the physical walk always
    /// steps tail-ward to head-ward through the unique index on `next`,
    /// whatever direction the caller asked for. Ascending output reverses the
    /// collected sequence; descending returns it as walked.
    pub fn ordered(&self, query: OrderQuery) -> Result<Vec<Entry>, StoreError> {
        if query.limit < MIN_LIMIT || query.limit > MAX_LIMIT {
            return Err(StoreError::InvalidInput("limit must be within 1..=100"));
        }

        let start = match query.start_id {
            Some(id) => entry_by_id_tx(&self.conn, id)?.ok_or(StoreError::UnknownId { id })?,
            None => tail(&self.conn)?.ok_or(StoreError::EmptyChain)?,
        };

        let mut collected = vec![start];
        while collected.len() < query.limit {
            let current_name = match collected.last() {
                Some(entry) => entry.name.clone(),
                None => break,
            };
            match predecessor_tx(&self.conn, &current_name)? {
                Some(prev) => collected.push(prev),
                None => break,
            }
        }

        if query.direction == Direction::Ascending {
            collected.reverse();
        }
        Ok(collected)
    }
}

/// Resolves the chain's tail (`next IS NULL`). Freshly added unlinked rows are
/// transient singletons that also carry a NULL pointer, so prefer a row some
/// other entry links to; among standalone rows, take the oldest for
/// determinism.
fn tail(conn: &Connection) -> Result<Option<Entry>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT e.id, e.name, e.next, e.created_at_ms, e.updated_at_ms \
             FROM entries e \
             WHERE e.next IS NULL \
             ORDER BY EXISTS(SELECT 1 FROM entries p WHERE p.next = e.name) DESC, e.id ASC \
             LIMIT 1",
            [],
            |row| {
                Ok(Entry {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    next: row.get(2)?,
                    created_at_ms: row.get(3)?,
                    updated_at_ms: row.get(4)?,
                })
            },
        )
        .optional()?)
}

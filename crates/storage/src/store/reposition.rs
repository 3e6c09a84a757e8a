#![forbid(unsafe_code)]

use super::{
    RepositionEntryRequest, SqliteStore, StoreError, canonicalize_name, entry_by_id_tx,
    entry_by_name_tx, map_corrupt, now_ms, predecessor_tx, rename_tx, require_entry_by_name_tx,
};
use cl_core::model::Entry;
use rusqlite::params;

impl SqliteStore {
    /// Relocates an entry in one transaction: splice out of the current
    /// position, splice into the destination. No other transaction ever sees
    /// the entry detached from both positions.
    pub fn reposition_entry(
        &mut self,
        request: RepositionEntryRequest,
    ) -> Result<Entry, StoreError> {
        let name = canonicalize_name(&request.name)?;
        let prev = request.prev.as_deref().map(canonicalize_name).transpose()?;
        let next = request.next.as_deref().map(canonicalize_name).transpose()?;

        let now_ms = now_ms();
        let tx = self.write_tx()?;

        let Some(entry) = entry_by_id_tx(&tx, request.id)? else {
            return Err(StoreError::UnknownId { id: request.id });
        };

        if prev.as_deref() == Some(entry.name.as_str())
            || next.as_deref() == Some(entry.name.as_str())
        {
            return Err(StoreError::InvalidInput("an entry cannot neighbor itself"));
        }

        let current_prev = predecessor_tx(&tx, &entry.name)?;

        let in_place = prev.as_deref() == current_prev.as_ref().map(|p| p.name.as_str())
            && next.as_deref() == entry.next.as_deref();

        if in_place {
            if name == entry.name {
                return Ok(entry);
            }
            if entry_by_name_tx(&tx, &name)?.is_some() {
                return Err(StoreError::NameTaken { name });
            }
            let renamed = rename_tx(&tx, &entry, &name, now_ms)?;
            tx.commit().map_err(map_corrupt)?;
            return Ok(renamed);
        }

        if name != entry.name && entry_by_name_tx(&tx, &name)?.is_some() {
            return Err(StoreError::NameTaken { name });
        }

        // Destination checks run against the chain as it will look once the
        // entry is spliced out of its current position.
        let dest_prev = match prev.as_deref() {
            Some(prev_name) => Some(require_entry_by_name_tx(&tx, prev_name)?),
            None => None,
        };

        if let Some(next_name) = next.as_deref() {
            require_entry_by_name_tx(&tx, next_name)?;
            match &dest_prev {
                Some(prev_row) => {
                    let effective = if prev_row.next.as_deref() == Some(entry.name.as_str()) {
                        entry.next.as_deref()
                    } else {
                        prev_row.next.as_deref()
                    };
                    if effective != Some(next_name) {
                        return Err(StoreError::NotAdjacent {
                            prev: prev_row.name.clone(),
                            next: next_name.to_string(),
                        });
                    }
                }
                None => {
                    // After the splice-out, the slot before `next` belongs to
                    // the moved entry's old predecessor, not to the entry.
                    let holder = match predecessor_tx(&tx, next_name)? {
                        Some(holder) if holder.id == entry.id => current_prev.clone(),
                        other => other,
                    };
                    if let Some(holder) = holder {
                        return Err(StoreError::NextTaken {
                            next: next_name.to_string(),
                            holder: holder.name,
                        });
                    }
                }
            }
        } else if let Some(prev_row) = &dest_prev {
            let effective = if prev_row.next.as_deref() == Some(entry.name.as_str()) {
                entry.next.clone()
            } else {
                prev_row.next.clone()
            };
            if let Some(successor) = effective {
                return Err(StoreError::TailOccupied {
                    prev: prev_row.name.clone(),
                    successor,
                });
            }
        }

        // Pointer patches: splice over the old gap, re-point the destination
        // predecessor, re-point the moved row itself.
        let mut patches: Vec<(i64, Option<String>)> = Vec::new();
        if let Some(cur) = &current_prev {
            let stays_predecessor = dest_prev.as_ref().is_some_and(|p| p.id == cur.id);
            if !stays_predecessor {
                patches.push((cur.id, entry.next.clone()));
            }
        }
        if let Some(prev_row) = &dest_prev {
            patches.push((prev_row.id, Some(name.clone())));
        }
        patches.push((entry.id, next.clone()));

        // Two-phase write: the unique index on `next` is enforced per
        // statement, and a final value may collide with a value another patch
        // is about to release. NULLs never collide, so clear every touched
        // pointer before writing the final values.
        for (row_id, _) in &patches {
            tx.execute(
                "UPDATE entries SET next = NULL WHERE id = ?1",
                params![row_id],
            )
            .map_err(map_corrupt)?;
        }
        for (row_id, value) in &patches {
            tx.execute(
                "UPDATE entries SET next = ?2, updated_at_ms = ?3 WHERE id = ?1",
                params![row_id, value, now_ms],
            )
            .map_err(map_corrupt)?;
        }

        if name != entry.name {
            // Rename folded into the same move; the destination predecessor
            // above already points at the new name.
            tx.execute(
                "UPDATE entries SET name = ?2, updated_at_ms = ?3 WHERE id = ?1",
                params![entry.id, name, now_ms],
            )
            .map_err(map_corrupt)?;
        }

        tx.commit().map_err(map_corrupt)?;
        Ok(Entry {
            id: entry.id,
            name,
            next,
            created_at_ms: entry.created_at_ms,
            updated_at_ms: now_ms,
        })
    }
}

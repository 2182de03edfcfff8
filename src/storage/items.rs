//! SQLite implementation of [`ItemStore`].
//!
//! Every mutation that must not race with a reorder runs inside a
//! `BEGIN IMMEDIATE` transaction. SQLite grants the write lock when the
//! transaction begins, so the target row and the whole band above the new
//! rank are held for the lifetime of the transaction. The `Transaction`
//! guard rolls back on drop, which covers every early return.

use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};

use super::pool::ConnectionPool;
use super::{ItemStore, StoreError, StoreResult};
use crate::model::{Item, ItemDraft, ListPage, PageMeta, PriorityChange};

const INSERT_ITEM_SQL: &str = "INSERT INTO items (project_id, name, description)
VALUES (?1, ?2, ?3)
RETURNING id, project_id, name, description, priority, removed, created_at";

const SOFT_DELETE_SQL: &str = "UPDATE items SET removed = 1
WHERE id = ?1 AND project_id = ?2
RETURNING id, project_id, name, description, priority, removed, created_at";

const UPDATE_ITEM_SQL: &str = "UPDATE items
SET name = ?3, description = COALESCE(?4, description)
WHERE id = ?1 AND project_id = ?2
RETURNING id, project_id, name, description, priority, removed, created_at";

const LIST_ITEMS_SQL: &str = "SELECT id, project_id, name, description, priority, removed, created_at
FROM items
ORDER BY id
LIMIT ?1 OFFSET ?2";

const SELECT_BAND_SQL: &str = "SELECT id, priority FROM items
WHERE priority >= ?1 AND id <> ?2
ORDER BY priority, id";

const SHIFT_BAND_SQL: &str = "UPDATE items SET priority = priority + 1
WHERE priority >= ?1 AND id <> ?2";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        priority: row.get(4)?,
        removed: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Lock the target row for the rest of the transaction.
///
/// The write lock is already held by the immediate transaction; reading the
/// row here is what turns a missing id/project pair into `NotFound` before
/// anything is written.
fn lock_target(tx: &Transaction<'_>, id: i64, project_id: i64) -> StoreResult<i64> {
    tx.query_row(
        "SELECT priority FROM items WHERE id = ?1 AND project_id = ?2",
        params![id, project_id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(StoreError::NotFound { id, project_id })
}

/// Item store backed by the pooled SQLite database.
#[derive(Clone)]
pub struct SqliteItemStore {
    pool: ConnectionPool,
}

impl SqliteItemStore {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

impl ItemStore for SqliteItemStore {
    fn create(&self, project_id: i64, draft: &ItemDraft) -> StoreResult<Item> {
        let conn = self.pool.get()?;
        let item = conn.query_row(
            INSERT_ITEM_SQL,
            params![project_id, draft.name, draft.description],
            item_from_row,
        )?;
        Ok(item)
    }

    fn soft_delete(&self, id: i64, project_id: i64) -> StoreResult<Item> {
        let conn = self.pool.get()?;
        conn.query_row(SOFT_DELETE_SQL, params![id, project_id], item_from_row)
            .optional()?
            .ok_or(StoreError::NotFound { id, project_id })
    }

    fn update(&self, id: i64, project_id: i64, draft: &ItemDraft) -> StoreResult<Item> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        lock_target(&tx, id, project_id)?;
        let item = tx.query_row(
            UPDATE_ITEM_SQL,
            params![id, project_id, draft.name, draft.description],
            item_from_row,
        )?;

        tx.commit()?;
        Ok(item)
    }

    fn reprioritize(
        &self,
        id: i64,
        project_id: i64,
        new_priority: i64,
    ) -> StoreResult<Vec<PriorityChange>> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = lock_target(&tx, id, project_id)?;

        let band = {
            let mut stmt = tx.prepare(SELECT_BAND_SQL)?;
            let rows = stmt.query_map(params![new_priority, id], |row| {
                Ok(PriorityChange {
                    id: row.get(0)?,
                    priority: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        // SQLite silently widens an overflowing `priority + 1` to REAL, so
        // the band is checked before anything is written.
        let mut changes = band
            .into_iter()
            .map(|row| {
                row.priority
                    .checked_add(1)
                    .map(|priority| PriorityChange { id: row.id, priority })
                    .ok_or(StoreError::PriorityOverflow { id: row.id })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let shifted = tx.execute(SHIFT_BAND_SQL, params![new_priority, id])?;
        debug_assert_eq!(shifted, changes.len());

        tx.execute(
            "UPDATE items SET priority = ?3 WHERE id = ?1 AND project_id = ?2",
            params![id, project_id, new_priority],
        )?;

        tx.commit()?;

        tracing::debug!(
            id,
            project_id,
            from = previous,
            to = new_priority,
            shifted,
            "Priority band shifted"
        );

        changes.push(PriorityChange {
            id,
            priority: new_priority,
        });
        Ok(changes)
    }

    fn list(&self, limit: u32, offset: u32) -> StoreResult<ListPage> {
        let mut conn = self.pool.get()?;
        // One read transaction so the page and the counters share a snapshot.
        let tx = conn.transaction()?;

        let goods = {
            let mut stmt = tx.prepare(LIST_ITEMS_SQL)?;
            let rows = stmt.query_map(params![limit, offset], item_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };

        let (total, removed): (i64, i64) = tx.query_row(
            "SELECT COUNT(*), COALESCE(SUM(removed), 0) FROM items",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        tx.commit()?;

        Ok(ListPage {
            meta: PageMeta {
                total: u64::try_from(total).unwrap_or_default(),
                removed: u64::try_from(removed).unwrap_or_default(),
                limit,
                offset,
            },
            goods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteItemStore) {
        let temp_dir = TempDir::new().unwrap();
        let pool = ConnectionPool::open(
            temp_dir.path().join("test.db"),
            4,
            Duration::from_secs(2),
        )
        .unwrap();
        (temp_dir, SqliteItemStore::new(pool))
    }

    fn create_at(store: &SqliteItemStore, project_id: i64, name: &str, priority: i64) -> Item {
        let item = store
            .create(project_id, &ItemDraft::new(name, None))
            .unwrap();
        store
            .pool()
            .get()
            .unwrap()
            .execute(
                "UPDATE items SET priority = ?2 WHERE id = ?1",
                params![item.id, priority],
            )
            .unwrap();
        Item { priority, ..item }
    }

    fn priority_of(store: &SqliteItemStore, id: i64) -> i64 {
        store
            .pool()
            .get()
            .unwrap()
            .query_row("SELECT priority FROM items WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .unwrap()
    }

    #[test]
    fn test_create_returns_backend_defaults() {
        let (_dir, store) = test_store();

        let item = store
            .create(5, &ItemDraft::new("Widget", None))
            .unwrap();

        assert!(item.id > 0);
        assert_eq!(item.project_id, 5);
        assert_eq!(item.name, "Widget");
        assert_eq!(item.description, None);
        assert_eq!(item.priority, 0);
        assert!(!item.removed);
    }

    #[test]
    fn test_create_assigns_distinct_ids() {
        let (_dir, store) = test_store();
        let a = store.create(1, &ItemDraft::new("a", None)).unwrap();
        let b = store.create(1, &ItemDraft::new("b", None)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_soft_delete_marks_removed() {
        let (_dir, store) = test_store();
        let item = store.create(5, &ItemDraft::new("Widget", None)).unwrap();

        let removed = store.soft_delete(item.id, 5).unwrap();
        assert!(removed.removed);
        assert_eq!(removed.id, item.id);
        assert_eq!(removed.created_at, item.created_at);
    }

    #[test]
    fn test_soft_delete_twice_succeeds() {
        let (_dir, store) = test_store();
        let item = store.create(5, &ItemDraft::new("Widget", None)).unwrap();

        store.soft_delete(item.id, 5).unwrap();
        let again = store.soft_delete(item.id, 5).unwrap();
        assert!(again.removed);
    }

    #[test]
    fn test_soft_delete_wrong_project_is_not_found() {
        let (_dir, store) = test_store();
        let item = store.create(5, &ItemDraft::new("Widget", None)).unwrap();

        let err = store.soft_delete(item.id, 6).unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.list(10, 0).unwrap().goods[0].removed);
    }

    #[test]
    fn test_update_keeps_description_when_absent() {
        let (_dir, store) = test_store();
        let item = store
            .create(5, &ItemDraft::new("Widget", Some("blue".into())))
            .unwrap();

        let renamed = store
            .update(item.id, 5, &ItemDraft::new("Gadget", Some(String::new())))
            .unwrap();
        assert_eq!(renamed.name, "Gadget");
        assert_eq!(renamed.description.as_deref(), Some("blue"));

        let redescribed = store
            .update(item.id, 5, &ItemDraft::new("Gadget", Some("red".into())))
            .unwrap();
        assert_eq!(redescribed.description.as_deref(), Some("red"));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (_dir, store) = test_store();
        let err = store
            .update(42, 1, &ItemDraft::new("x", None))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_reprioritize_shifts_band() {
        let (_dir, store) = test_store();
        let low = create_at(&store, 1, "low", 1);
        let a = create_at(&store, 1, "a", 3);
        let b = create_at(&store, 2, "b", 4);
        let c = create_at(&store, 1, "c", 5);
        let target = create_at(&store, 5, "target", 0);

        let changes = store.reprioritize(target.id, 5, 3).unwrap();

        assert_eq!(
            changes,
            vec![
                PriorityChange { id: a.id, priority: 4 },
                PriorityChange { id: b.id, priority: 5 },
                PriorityChange { id: c.id, priority: 6 },
                PriorityChange { id: target.id, priority: 3 },
            ]
        );
        assert_eq!(priority_of(&store, low.id), 1);
        assert_eq!(priority_of(&store, target.id), 3);
        assert_eq!(priority_of(&store, c.id), 6);
    }

    #[test]
    fn test_reprioritize_to_current_priority_still_shifts() {
        let (_dir, store) = test_store();
        let target = create_at(&store, 1, "target", 2);
        let other = create_at(&store, 1, "other", 2);

        let changes = store.reprioritize(target.id, 1, 2).unwrap();

        assert_eq!(
            changes,
            vec![
                PriorityChange { id: other.id, priority: 3 },
                PriorityChange { id: target.id, priority: 2 },
            ]
        );
    }

    #[test]
    fn test_reprioritize_includes_removed_items() {
        let (_dir, store) = test_store();
        let gone = create_at(&store, 1, "gone", 7);
        store.soft_delete(gone.id, 1).unwrap();
        let target = create_at(&store, 1, "target", 0);

        let changes = store.reprioritize(target.id, 1, 7).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(priority_of(&store, gone.id), 8);
    }

    #[test]
    fn test_reprioritize_missing_target_changes_nothing() {
        let (_dir, store) = test_store();
        let a = create_at(&store, 1, "a", 3);

        let err = store.reprioritize(a.id, 2, 1).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(priority_of(&store, a.id), 3);
    }

    #[test]
    fn test_reprioritize_rolls_back_on_failure_after_shift() {
        let (_dir, store) = test_store();
        let a = create_at(&store, 1, "a", 3);
        let b = create_at(&store, 1, "b", 4);
        let target = create_at(&store, 1, "target", 0);

        // Abort the final target write, after the band has been shifted.
        store
            .pool()
            .get()
            .unwrap()
            .execute_batch(&format!(
                "CREATE TRIGGER fail_target BEFORE UPDATE OF priority ON items
                 WHEN NEW.id = {} BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
                target.id
            ))
            .unwrap();

        let err = store.reprioritize(target.id, 1, 3).unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));

        assert_eq!(priority_of(&store, a.id), 3);
        assert_eq!(priority_of(&store, b.id), 4);
        assert_eq!(priority_of(&store, target.id), 0);
    }

    #[test]
    fn test_reprioritize_rejects_band_at_max_priority() {
        let (_dir, store) = test_store();
        let top = create_at(&store, 1, "top", i64::MAX);
        let below = create_at(&store, 1, "below", i64::MAX - 1);
        let target = create_at(&store, 2, "target", 0);

        let err = store.reprioritize(target.id, 2, i64::MAX - 1).unwrap_err();
        assert!(matches!(err, StoreError::PriorityOverflow { id } if id == top.id));

        // Nothing moved and every row still reads back as an integer.
        assert_eq!(priority_of(&store, top.id), i64::MAX);
        assert_eq!(priority_of(&store, below.id), i64::MAX - 1);
        assert_eq!(priority_of(&store, target.id), 0);
        assert_eq!(store.list(10, 0).unwrap().goods.len(), 3);
    }

    #[test]
    fn test_reprioritize_to_max_with_empty_band() {
        let (_dir, store) = test_store();
        let target = create_at(&store, 1, "target", 0);

        let changes = store.reprioritize(target.id, 1, i64::MAX).unwrap();
        assert_eq!(
            changes,
            vec![PriorityChange { id: target.id, priority: i64::MAX }]
        );
    }

    #[test]
    fn test_list_counts_whole_table() {
        let (_dir, store) = test_store();
        for i in 0..5 {
            store
                .create(1, &ItemDraft::new(format!("item-{i}"), None))
                .unwrap();
        }
        let first = store.list(10, 0).unwrap().goods[0].clone();
        store.soft_delete(first.id, 1).unwrap();

        let page = store.list(2, 1).unwrap();
        assert_eq!(page.goods.len(), 2);
        assert_eq!(page.meta.total, 5);
        assert_eq!(page.meta.removed, 1);
        assert_eq!(page.meta.limit, 2);
        assert_eq!(page.meta.offset, 1);
        assert!(page.goods[0].id < page.goods[1].id);
        assert_eq!(page.goods[0].name, "item-1");
    }

    #[test]
    fn test_concurrent_reorders_leave_no_collisions() {
        let (_dir, store) = test_store();
        let items: Vec<Item> = (0..8)
            .map(|i| create_at(&store, 1, &format!("item-{i}"), i))
            .collect();

        std::thread::scope(|scope| {
            for (n, item) in items.iter().enumerate() {
                let store = &store;
                let target = 1 + (n as i64 % 3);
                scope.spawn(move || store.reprioritize(item.id, 1, target).unwrap());
            }
        });

        let mut priorities: Vec<i64> = items.iter().map(|i| priority_of(&store, i.id)).collect();
        priorities.sort_unstable();
        priorities.dedup();
        assert_eq!(priorities.len(), items.len());
    }
}

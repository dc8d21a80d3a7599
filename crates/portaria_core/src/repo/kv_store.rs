//! Key-value collection store over SQLite.
//!
//! # Responsibility
//! - Store each named collection as one JSON array under a fixed key.
//! - Offer a single read-modify-write primitive per collection.
//!
//! # Invariants
//! - An absent key reads as an empty collection.
//! - Writes replace the whole array inside an `IMMEDIATE` transaction, so a
//!   modification never interleaves with another writer.

use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Key holding the resident collection.
pub const RESIDENTS_KEY: &str = "residents";
/// Key holding the package collection.
pub const PACKAGES_KEY: &str = "packages";

/// JSON collection store backed by the `kv_entries` table.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = 'kv_entries'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::InvalidData(
                "missing required table `kv_entries`".to_string(),
            ));
        }
        Ok(Self { conn })
    }

    /// Reads one collection. Absent keys yield an empty vector.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> RepoResult<Vec<T>> {
        read_collection(self.conn, key)
    }

    /// Replaces one collection wholesale.
    pub fn write<T: Serialize>(&self, key: &str, items: &[T]) -> RepoResult<()> {
        write_collection(self.conn, key, items)
    }

    /// Runs `f` over the collection and persists the result atomically.
    ///
    /// When `f` fails nothing is written and the error is returned as is.
    pub fn modify<T, R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Vec<T>) -> RepoResult<R>,
    ) -> RepoResult<R>
    where
        T: Serialize + DeserializeOwned,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut items = read_collection(&tx, key)?;
        let output = f(&mut items)?;
        write_collection(&tx, key, &items)?;
        tx.commit()?;
        Ok(output)
    }
}

fn read_collection<T: DeserializeOwned>(conn: &Connection, key: &str) -> RepoResult<Vec<T>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM kv_entries WHERE key = ?1;",
            [key],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(json) => serde_json::from_str(&json).map_err(|err| {
            RepoError::InvalidData(format!("collection `{key}` is not a valid JSON array: {err}"))
        }),
        None => Ok(Vec::new()),
    }
}

fn write_collection<T: Serialize>(conn: &Connection, key: &str, items: &[T]) -> RepoResult<()> {
    let json = serde_json::to_string(items)?;
    conn.execute(
        "INSERT INTO kv_entries (key, value, updated_at)
         VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
         ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at;",
        params![key, json],
    )?;
    Ok(())
}

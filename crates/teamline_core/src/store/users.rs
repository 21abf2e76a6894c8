//! User store contract and SQLite implementation.
//!
//! # Invariants
//! - `save` validates the document before writing.
//! - Username/email lookups are exact matches against live documents; the
//!   schema's unique indexes back them up under concurrency.

use crate::model::user::{User, UserId};
use crate::model::EntityKind;
use crate::store::{
    decode_doc, delete_doc, ensure_table, load_doc, load_docs_by_ids, save_doc, StoreResult,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

const TABLE: &str = "users";

/// Store contract for user documents.
pub trait UserStore {
    fn get(&self, id: UserId) -> StoreResult<Option<User>>;
    /// Loads users for an id set; absent ids are skipped.
    fn get_many(&self, ids: &BTreeSet<UserId>) -> StoreResult<Vec<User>>;
    fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    fn list_all(&self) -> StoreResult<Vec<User>>;
    /// Usernames starting with `prefix`, sorted ascending.
    fn search_usernames(&self, prefix: &str) -> StoreResult<Vec<String>>;
    fn save(&self, user: &User) -> StoreResult<()>;
    /// Saves each document with an independent single-row write.
    fn save_all(&self, users: &[User]) -> StoreResult<()>;
    fn delete(&self, id: UserId) -> StoreResult<()>;
}

/// SQLite-backed user store over the `users` document table.
pub struct SqliteUserStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserStore<'conn> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_table(conn, TABLE)?;
        Ok(Self { conn })
    }

    fn find_by_field(&self, field: &str, value: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT doc FROM {TABLE} WHERE json_extract(doc, '$.{field}') = ?1;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([value])?;
        if let Some(row) = rows.next()? {
            let doc: String = row.get(0)?;
            return Ok(Some(decode_doc(TABLE, &doc)?));
        }
        Ok(None)
    }
}

impl UserStore for SqliteUserStore<'_> {
    fn get(&self, id: UserId) -> StoreResult<Option<User>> {
        load_doc(self.conn, TABLE, id)
    }

    fn get_many(&self, ids: &BTreeSet<UserId>) -> StoreResult<Vec<User>> {
        load_docs_by_ids(self.conn, TABLE, ids)
    }

    fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_by_field("username", username)
    }

    fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_by_field("email", email)
    }

    fn list_all(&self) -> StoreResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT doc FROM {TABLE}
             ORDER BY json_extract(doc, '$.username') ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            let doc: String = row.get(0)?;
            users.push(decode_doc(TABLE, &doc)?);
        }
        Ok(users)
    }

    fn search_usernames(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT json_extract(doc, '$.username') FROM {TABLE}
             WHERE json_extract(doc, '$.username') LIKE ?1 || '%'
             ORDER BY 1 ASC;"
        ))?;
        let mut rows = stmt.query([prefix])?;
        let mut usernames = Vec::new();
        while let Some(row) = rows.next()? {
            usernames.push(row.get(0)?);
        }
        Ok(usernames)
    }

    fn save(&self, user: &User) -> StoreResult<()> {
        user.validate()?;
        save_doc(self.conn, TABLE, user.id, user)
    }

    fn save_all(&self, users: &[User]) -> StoreResult<()> {
        for user in users {
            self.save(user)?;
        }
        Ok(())
    }

    fn delete(&self, id: UserId) -> StoreResult<()> {
        delete_doc(self.conn, TABLE, EntityKind::User, id)
    }
}

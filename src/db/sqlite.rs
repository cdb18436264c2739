use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Db;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteDb {
    conn: Mutex<Connection>,
}

impl SqliteDb {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Distinguishes a UNIQUE constraint violation from other SQLite failures,
/// so duplicate keys surface as Conflict instead of an internal error.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        address: row.get(3)?,
        credential_hash: row.get(4)?,
        role: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

fn store_from_row(row: &Row<'_>) -> rusqlite::Result<Store> {
    Ok(Store {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        address: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn rating_from_row(row: &Row<'_>) -> rusqlite::Result<Rating> {
    Ok(Rating {
        id: row.get(0)?,
        user_id: row.get(1)?,
        store_id: row.get(2)?,
        value: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

const USER_COLUMNS: &str = "id, name, email, address, credential_hash, role, created_at, updated_at";
const STORE_COLUMNS: &str = "id, name, email, address, owner_id, created_at, updated_at";
const RATING_COLUMNS: &str = "id, user_id, store_id, value, created_at, updated_at";

impl Db for SqliteDb {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, address, credential_hash, role, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    user.id,
                    user.name,
                    user.email,
                    user.address,
                    user.credential_hash,
                    user.role,
                    format_datetime(&user.created_at),
                    format_datetime(&user.updated_at),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    Error::Conflict("email already registered".to_string())
                } else {
                    Error::from(e)
                }
            })?;
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_user_role(&self, id: &str, role: Role) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
            params![role, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn update_user_password(&self, id: &str, credential_hash: &str) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET credential_hash = ?1, updated_at = ?2 WHERE id = ?3",
            params![credential_hash, format_datetime(&Utc::now()), id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        // FK actions apply: the user's ratings are deleted, owned stores
        // are kept with owner_id set NULL.
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_users(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(Error::from)
    }

    // Store operations

    fn create_store(&self, store: &Store) -> Result<()> {
        self.conn().execute(
            "INSERT INTO stores (id, name, email, address, owner_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                store.id,
                store.name,
                store.email,
                store.address,
                store.owner_id,
                format_datetime(&store.created_at),
                format_datetime(&store.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_store(&self, id: &str) -> Result<Option<Store>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = ?1"),
            params![id],
            store_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_stores(&self, search: Option<&str>, address: Option<&str>) -> Result<Vec<Store>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STORE_COLUMNS} FROM stores
             WHERE (?1 IS NULL OR name LIKE '%' || ?1 || '%')
               AND (?2 IS NULL OR address LIKE '%' || ?2 || '%')
             ORDER BY name"
        ))?;

        let rows = stmt.query_map(params![search, address], store_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_stores_by_owner(&self, owner_id: &str) -> Result<Vec<Store>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE owner_id = ?1 ORDER BY name"
        ))?;

        let rows = stmt.query_map(params![owner_id], store_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_store(&self, id: &str) -> Result<bool> {
        // ON DELETE CASCADE removes every rating referencing the store.
        let rows = self
            .conn()
            .execute("DELETE FROM stores WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn count_stores(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM stores", [], |row| row.get(0))
            .map_err(Error::from)
    }

    // Rating operations

    fn upsert_rating(&self, user_id: &str, store_id: &str, value: i32) -> Result<Rating> {
        if !(1..=5).contains(&value) {
            return Err(Error::invalid("value", "rating must be between 1 and 5"));
        }

        let conn = self.conn();

        let store_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM stores WHERE id = ?1)",
            params![store_id],
            |row| row.get(0),
        )?;
        if !store_exists {
            return Err(Error::NotFound);
        }

        // Single atomic statement keyed by the natural key. A conflicting row
        // keeps its id and created_at; only value and updated_at move. The
        // UNIQUE constraint, not application logic, rules out a second row.
        let now = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO ratings (id, user_id, store_id, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(user_id, store_id)
             DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![uuid::Uuid::new_v4().to_string(), user_id, store_id, value, now],
        )?;

        conn.query_row(
            &format!("SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = ?1 AND store_id = ?2"),
            params![user_id, store_id],
            rating_from_row,
        )
        .map_err(Error::from)
    }

    fn get_user_rating(&self, user_id: &str, store_id: &str) -> Result<Option<Rating>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = ?1 AND store_id = ?2"),
            params![user_id, store_id],
            rating_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_store_ratings(&self, store_id: &str) -> Result<Vec<RatingWithUser>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.user_id, r.store_id, r.value, r.created_at, r.updated_at,
                    u.id, u.name, u.email
             FROM ratings r
             JOIN users u ON u.id = r.user_id
             WHERE r.store_id = ?1
             ORDER BY r.created_at DESC",
        )?;

        let rows = stmt.query_map(params![store_id], |row| {
            Ok(RatingWithUser {
                rating: Rating {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    store_id: row.get(2)?,
                    value: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    updated_at: parse_datetime(&row.get::<_, String>(5)?),
                },
                user: RaterView {
                    id: row.get(6)?,
                    name: row.get(7)?,
                    email: row.get(8)?,
                },
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn store_aggregate(&self, store_id: &str) -> Result<RatingAggregate> {
        let conn = self.conn();
        // Computed live from current rows; COALESCE pins the empty set to
        // exactly 0.0 rather than NULL.
        conn.query_row(
            "SELECT COALESCE(AVG(value), 0.0), COUNT(*) FROM ratings WHERE store_id = ?1",
            params![store_id],
            |row| {
                Ok(RatingAggregate {
                    average_rating: row.get(0)?,
                    total_ratings: row.get(1)?,
                })
            },
        )
        .map_err(Error::from)
    }

    fn count_ratings(&self) -> Result<i64> {
        let conn = self.conn();
        conn.query_row("SELECT COUNT(*) FROM ratings", [], |row| row.get(0))
            .map_err(Error::from)
    }

    fn has_admin_user(&self) -> Result<bool> {
        let conn = self.conn();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')",
            [],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }
}

//! SQLite storage backend

use crate::core::package::{
    PackageHash, PackageName, PackageRecord, PackageRef, PackageVersion, PushOutcome,
};
use crate::core::principal::Principal;
use crate::core::service::ServiceError;
use crate::storage::StorageBackend;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Database schema version
const SCHEMA_VERSION: i32 = 1;

/// Initialize the registry database
pub fn initialize_database(db_path: &Path) -> Result<(), ServiceError> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ServiceError::Storage(format!(
                "Failed to create database directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);

    if current_version < SCHEMA_VERSION {
        apply_schema_updates(&conn, current_version)?;

        conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        info!(
            "Migrated registry database {} from schema v{} to v{}",
            db_path.display(),
            current_version,
            SCHEMA_VERSION
        );
    }

    Ok(())
}

/// Apply database schema updates
fn apply_schema_updates(conn: &Connection, current_version: i32) -> rusqlite::Result<()> {
    if current_version < 1 {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS packages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (owner, name)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS versions (
                package_id INTEGER NOT NULL,
                hash TEXT NOT NULL,
                description TEXT NOT NULL,
                pushed_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                seq INTEGER NOT NULL,
                PRIMARY KEY (package_id, hash)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS access (
                package_id INTEGER NOT NULL,
                principal TEXT NOT NULL,
                PRIMARY KEY (package_id, principal)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_packages_owner ON packages(owner)",
            [],
        )?;
    }

    Ok(())
}

/// Raw version row before validation
type VersionRow = (String, String, String, String, String);

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ServiceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| ServiceError::Storage(format!("Corrupt timestamp '{}': {}", value, e)))
}

/// Stored values were validated on the way in; failing here means the file was edited
fn corrupt(err: ServiceError) -> ServiceError {
    ServiceError::Storage(format!("Corrupt registry row: {}", err))
}

fn find_package_id(conn: &Connection, package: &PackageRef) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM packages WHERE owner = ?1 AND name = ?2",
        params![package.owner.as_str(), package.name.as_str()],
        |row| row.get(0),
    )
    .optional()
}

fn load_record(
    conn: &Connection,
    package: &PackageRef,
) -> Result<Option<PackageRecord>, ServiceError> {
    let row: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, created_at FROM packages WHERE owner = ?1 AND name = ?2",
            params![package.owner.as_str(), package.name.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((package_id, created_at)) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT hash, description, pushed_by, created_at, updated_at
         FROM versions WHERE package_id = ?1 ORDER BY seq",
    )?;
    let rows: Vec<VersionRow> = stmt
        .query_map([package_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .collect::<rusqlite::Result<_>>()?;

    let mut versions = Vec::with_capacity(rows.len());
    for (hash, description, pushed_by, created, updated) in rows {
        versions.push(PackageVersion {
            hash: PackageHash::new(hash).map_err(corrupt)?,
            description,
            pushed_by: Principal::new(pushed_by).map_err(corrupt)?,
            created_at: parse_timestamp(&created)?,
            updated_at: parse_timestamp(&updated)?,
        });
    }

    let mut stmt = conn.prepare("SELECT principal FROM access WHERE package_id = ?1")?;
    let principals: Vec<String> = stmt
        .query_map([package_id], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    let grants = principals
        .into_iter()
        .map(|p| Principal::new(p).map_err(corrupt))
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(Some(PackageRecord {
        package: package.clone(),
        created_at: parse_timestamp(&created_at)?,
        versions,
        grants,
    }))
}

/// SQLite-backed package store.
///
/// Every operation opens its own connection on the blocking pool.
pub struct SqliteStorage {
    db_path: PathBuf,
}

impl SqliteStorage {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Run `op` against a fresh connection on the blocking thread pool
    async fn with_connection<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, ServiceError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&db_path).map_err(|e| {
                ServiceError::Storage(format!(
                    "Failed to open database {}: {}",
                    db_path.display(),
                    e
                ))
            })?;
            op(&mut conn)
        })
        .await
        .map_err(|e| ServiceError::Storage(format!("Database task failed: {}", e)))?
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn initialize(&self) -> Result<(), ServiceError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || initialize_database(&db_path))
            .await
            .map_err(|e| ServiceError::Storage(format!("Database task failed: {}", e)))??;
        info!("Initialized SQLite storage at: {}", self.db_path.display());
        Ok(())
    }

    async fn load(&self, package: &PackageRef) -> Result<Option<PackageRecord>, ServiceError> {
        let package = package.clone();
        self.with_connection(move |conn| load_record(conn, &package))
            .await
    }

    async fn list_owned(&self, owner: &Principal) -> Result<Vec<PackageRecord>, ServiceError> {
        let owner = owner.clone();
        self.with_connection(move |conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM packages WHERE owner = ?1 ORDER BY name")?;
            let names: Vec<String> = stmt
                .query_map([owner.as_str()], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?;

            let mut records = Vec::with_capacity(names.len());
            for name in names {
                let package = PackageRef {
                    owner: owner.clone(),
                    name: PackageName::new(name).map_err(corrupt)?,
                };
                if let Some(record) = load_record(conn, &package)? {
                    records.push(record);
                }
            }
            Ok(records)
        })
        .await
    }

    async fn push(
        &self,
        package: &PackageRef,
        version: &PackageVersion,
    ) -> Result<PushOutcome, ServiceError> {
        let package = package.clone();
        let version = version.clone();
        self.with_connection(move |conn| {
            let tx = conn.transaction()?;

            let (package_id, created) = match find_package_id(&tx, &package)? {
                Some(id) => (id, false),
                None => {
                    tx.execute(
                        "INSERT INTO packages (owner, name, created_at) VALUES (?1, ?2, ?3)",
                        params![
                            package.owner.as_str(),
                            package.name.as_str(),
                            version.created_at.to_rfc3339()
                        ],
                    )?;
                    (tx.last_insert_rowid(), true)
                }
            };

            let next_seq: i64 = tx.query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM versions WHERE package_id = ?1",
                [package_id],
                |row| row.get(0),
            )?;

            let updated = tx.execute(
                "UPDATE versions SET description = ?1, pushed_by = ?2, updated_at = ?3, seq = ?4
                 WHERE package_id = ?5 AND hash = ?6",
                params![
                    version.description,
                    version.pushed_by.as_str(),
                    version.updated_at.to_rfc3339(),
                    next_seq,
                    package_id,
                    version.hash.as_str()
                ],
            )?;

            if updated == 0 {
                tx.execute(
                    "INSERT INTO versions
                     (package_id, hash, description, pushed_by, created_at, updated_at, seq)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        package_id,
                        version.hash.as_str(),
                        version.description,
                        version.pushed_by.as_str(),
                        version.created_at.to_rfc3339(),
                        version.updated_at.to_rfc3339(),
                        next_seq
                    ],
                )?;
            }

            tx.commit()?;

            let outcome = if created {
                PushOutcome::Created
            } else if updated > 0 {
                PushOutcome::Updated
            } else {
                PushOutcome::NewVersion
            };
            debug!("Stored {}@{} ({})", package, version.hash, outcome.as_str());
            Ok(outcome)
        })
        .await
    }

    async fn grant(
        &self,
        package: &PackageRef,
        principal: &Principal,
    ) -> Result<bool, ServiceError> {
        let package = package.clone();
        let principal = principal.clone();
        self.with_connection(move |conn| {
            if principal == package.owner {
                return Ok(false);
            }
            let package_id = find_package_id(conn, &package)?
                .ok_or_else(|| ServiceError::PackageNotFound(package.to_string()))?;
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO access (package_id, principal) VALUES (?1, ?2)",
                params![package_id, principal.as_str()],
            )?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn revoke(
        &self,
        package: &PackageRef,
        principal: &Principal,
    ) -> Result<bool, ServiceError> {
        let package = package.clone();
        let principal = principal.clone();
        self.with_connection(move |conn| {
            let package_id = find_package_id(conn, &package)?
                .ok_or_else(|| ServiceError::PackageNotFound(package.to_string()))?;
            let removed = conn.execute(
                "DELETE FROM access WHERE package_id = ?1 AND principal = ?2",
                params![package_id, principal.as_str()],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete(&self, package: &PackageRef) -> Result<bool, ServiceError> {
        let package = package.clone();
        self.with_connection(move |conn| {
            let tx = conn.transaction()?;
            let Some(package_id) = find_package_id(&tx, &package)? else {
                return Ok(false);
            };
            tx.execute("DELETE FROM versions WHERE package_id = ?1", [package_id])?;
            tx.execute("DELETE FROM access WHERE package_id = ?1", [package_id])?;
            tx.execute("DELETE FROM packages WHERE id = ?1", [package_id])?;
            tx.commit()?;
            Ok(true)
        })
        .await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn version(hash: &str, by: &str, description: &str) -> PackageVersion {
        PackageVersion::new(
            PackageHash::new(hash).unwrap(),
            description.to_string(),
            Principal::new(by).unwrap(),
        )
    }

    async fn storage(temp_dir: &TempDir) -> SqliteStorage {
        let storage = SqliteStorage::new(temp_dir.path().join("registry.db"));
        storage.initialize().await.unwrap();
        storage
    }

    #[test]
    fn test_database_initialization() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("registry.db");

        initialize_database(&db_path).unwrap();
        // Second run must be a no-op
        initialize_database(&db_path).unwrap();

        let conn = Connection::open(&db_path).unwrap();
        for table in ["packages", "versions", "access", "schema_version"] {
            let count: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "table {} should exist", table);
        }

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_push_outcomes_and_ordering() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir).await;
        let id = PackageRef::parse("test_user", "pkgtoshare").unwrap();

        assert_eq!(
            storage.push(&id, &version("123", "test_user", "first")).await.unwrap(),
            PushOutcome::Created
        );
        assert_eq!(
            storage
                .push(&id, &version("456", "anotheruser", "second"))
                .await
                .unwrap(),
            PushOutcome::NewVersion
        );
        assert_eq!(
            storage
                .push(&id, &version("123", "test_user", "again"))
                .await
                .unwrap(),
            PushOutcome::Updated
        );

        let record = storage.load(&id).await.unwrap().unwrap();
        let hashes: Vec<&str> = record.versions.iter().map(|v| v.hash.as_str()).collect();
        assert_eq!(hashes, vec!["456", "123"]);
        let latest = record.latest().unwrap();
        assert_eq!(latest.description, "again");
        assert_eq!(latest.pushed_by.as_str(), "test_user");
    }

    #[tokio::test]
    async fn test_grants_persist_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let id = PackageRef::parse("test_user", "pkgtoshare").unwrap();
        let other = Principal::new("anotheruser").unwrap();

        {
            let storage = storage(&temp_dir).await;
            storage.push(&id, &version("123", "test_user", "")).await.unwrap();
            assert!(storage.grant(&id, &other).await.unwrap());
            assert!(!storage.grant(&id, &other).await.unwrap());
            assert!(storage.grant(&id, &Principal::public()).await.unwrap());
            assert!(!storage.grant(&id, &id.owner).await.unwrap());
        }

        let storage = storage(&temp_dir).await;
        let record = storage.load(&id).await.unwrap().unwrap();
        assert!(record.grants.contains(&other));
        assert!(record.is_public());
        assert!(!record.grants.contains(&id.owner));

        assert!(storage.revoke(&id, &other).await.unwrap());
        assert!(!storage.revoke(&id, &other).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_and_missing_package() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir).await;
        let id = PackageRef::parse("test_user", "gone").unwrap();
        let other = Principal::new("anotheruser").unwrap();

        assert!(matches!(
            storage.grant(&id, &other).await,
            Err(ServiceError::PackageNotFound(_))
        ));
        assert!(!storage.delete(&id).await.unwrap());

        storage.push(&id, &version("1", "test_user", "")).await.unwrap();
        storage.grant(&id, &other).await.unwrap();
        assert!(storage.delete(&id).await.unwrap());
        assert!(storage.load(&id).await.unwrap().is_none());

        // Re-creating starts from a clean slate
        storage.push(&id, &version("2", "test_user", "")).await.unwrap();
        let record = storage.load(&id).await.unwrap().unwrap();
        assert_eq!(record.versions.len(), 1);
        assert!(record.grants.is_empty());
    }

    #[tokio::test]
    async fn test_list_owned() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage(&temp_dir).await;
        for (owner, name) in [("alice", "zeta"), ("alice", "alpha"), ("bob", "beta")] {
            let id = PackageRef::parse(owner, name).unwrap();
            storage.push(&id, &version("1", owner, "")).await.unwrap();
        }

        let owned = storage
            .list_owned(&Principal::new("alice").unwrap())
            .await
            .unwrap();
        let names: Vec<&str> = owned.iter().map(|r| r.package.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}

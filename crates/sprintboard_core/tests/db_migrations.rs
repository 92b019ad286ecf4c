use rusqlite::Connection;
use sprintboard_core::db::migrations::latest_version;
use sprintboard_core::db::{open_db, open_db_in_memory, DbError};
use sprintboard_core::{KeyValueRepository, RepoError, SqliteKeyValueRepository};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprintboard.db");

    let conn_first = open_db(&path).unwrap();
    SqliteKeyValueRepository::try_new(&conn_first)
        .unwrap()
        .put("tasks", "[]")
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let repo = SqliteKeyValueRepository::try_new(&conn_second).unwrap();
    assert_eq!(repo.get("tasks").unwrap().as_deref(), Some("[]"));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repository_refuses_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteKeyValueRepository::try_new(&conn).err().unwrap();
    match err {
        RepoError::Db(DbError::SchemaNotReady {
            db_version,
            required,
        }) => {
            assert_eq!(db_version, 0);
            assert_eq!(required, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sqlite_repository_overwrites_and_removes_entries() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteKeyValueRepository::try_new(&conn).unwrap();

    assert!(repo.get("tasks").unwrap().is_none());
    repo.put("tasks", "[1]").unwrap();
    repo.put("tasks", "[2]").unwrap();
    assert_eq!(repo.get("tasks").unwrap().as_deref(), Some("[2]"));

    repo.remove("tasks").unwrap();
    repo.remove("tasks").unwrap();
    assert!(repo.get("tasks").unwrap().is_none());

    let err = repo.put("  ", "x").unwrap_err();
    assert!(matches!(err, RepoError::InvalidKey(_)));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

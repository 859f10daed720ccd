use themove_core::db::migrations::latest_version;
use themove_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "moves");
    assert_table_exists(&conn, "move_members");
    assert_table_exists(&conn, "move_comments");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("themove.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "move_members");
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
fn conflicting_legacy_table_reports_the_failing_migration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE moves (id TEXT PRIMARY KEY);")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert_eq!(err.schema_version(), Some(1));
    assert!(matches!(err, DbError::Migration { version: 1, .. }), "{err}");
    assert!(err.to_string().starts_with("move schema migration 1 failed"));
    assert!(std::error::Error::source(&err).is_some());

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
}

#[test]
fn foreign_keys_cascade_member_and_comment_rows() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO moves (
            id, title, category, status, time_range, location,
            exact_meeting_spot, participants, host_id, created_at
        ) VALUES ('m1', 'Run', 'Sports', 'Upcoming', '7-8', 'Track', 'Gate', 1, 'host', 1);
        INSERT INTO move_members (move_id, actor_id, relation) VALUES ('m1', 'host', 'joined');
        INSERT INTO move_comments (move_id, seq, user, text) VALUES ('m1', 1, 'Host', 'hi');
        DELETE FROM moves WHERE id = 'm1';",
    )
    .unwrap();

    assert_eq!(row_count(&conn, "move_members"), 0);
    assert_eq!(row_count(&conn, "move_comments"), 0);
}

#[test]
fn schema_rejects_unknown_status_labels() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO moves (
            id, title, category, status, time_range, location,
            exact_meeting_spot, participants, host_id, created_at
        ) VALUES ('m1', 'Run', 'Sports', 'live-now', '7-8', 'Track', 'Gate', 1, 'host', 1);",
        [],
    );
    assert!(result.is_err());
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
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

use portfolio_core::db::migrations::latest_version;
use portfolio_core::db::{open_db, open_db_in_memory, DbError};
use portfolio_core::{
    ContactoDraft, ContactoRepository, KeyValueStore, KvContactoRepository, RepoError,
    SqliteStore, StoreError,
};
use rusqlite::Connection;

fn draft(nombre: &str, email: &str) -> ContactoDraft {
    ContactoDraft {
        nombre: nombre.to_string(),
        email: email.to_string(),
        asunto: "consulta".to_string(),
        preferencia_contacto: "WhatsApp".to_string(),
        acepta_terminos: true,
        ..ContactoDraft::default()
    }
}

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
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
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteStore::try_new(&conn) {
        Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_without_kv_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteStore::try_new(&conn),
        Err(StoreError::MissingRequiredTable("kv_entries"))
    ));
}

#[test]
fn set_get_remove_and_usage() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    assert_eq!(store.get_item("k").unwrap(), None);
    store.set_item("k", "v1").unwrap();
    store.set_item("k", "valor").unwrap();
    store.set_item("ñ", "é").unwrap();

    assert_eq!(store.get_item("k").unwrap().as_deref(), Some("valor"));
    assert_eq!(store.used_bytes().unwrap(), 6 + 4);

    store.remove_item("k").unwrap();
    store.remove_item("k").unwrap();
    assert_eq!(store.get_item("k").unwrap(), None);
    assert_eq!(store.used_bytes().unwrap(), 4);
}

#[test]
fn quota_rejection_keeps_previous_value() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap().with_quota(Some(12));

    store.set_item("key", "small").unwrap();
    let err = store.set_item("key", "far too large").unwrap_err();

    assert!(matches!(
        err,
        StoreError::QuotaExceeded {
            requested_bytes: 16,
            quota_bytes: 12
        }
    ));
    assert_eq!(store.get_item("key").unwrap().as_deref(), Some("small"));
}

#[test]
fn contacts_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portfolio.db");

    let id = {
        let conn = open_db(&path).unwrap();
        let repo = KvContactoRepository::new(SqliteStore::try_new(&conn).unwrap());
        repo.add(&draft("Ana Ruiz", "ana@x.com")).unwrap().id().clone()
    };

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let repo = KvContactoRepository::new(SqliteStore::try_new(&conn).unwrap());
    let stored = repo.get_by_id(&id).unwrap().unwrap();
    assert_eq!(stored.email(), "ana@x.com");
}

#[test]
fn last_writer_wins_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let conn_a = open_db(&path).unwrap();
    let conn_b = open_db(&path).unwrap();
    let repo_a = KvContactoRepository::new(SqliteStore::try_new(&conn_a).unwrap());
    let repo_b = KvContactoRepository::new(SqliteStore::try_new(&conn_b).unwrap());

    repo_a.add(&draft("Ana Ruiz", "ana@x.com")).unwrap();
    repo_b.add(&draft("Luis Gil", "luis@x.com")).unwrap();
    repo_a.clear().unwrap();

    assert!(repo_b.get_all().unwrap().is_empty());
}

#[test]
fn sqlite_quota_surfaces_as_insufficient_storage() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap().with_quota(Some(64));
    let repo = KvContactoRepository::new(store);

    let err = repo.add(&draft("Ana Ruiz", "ana@x.com")).unwrap_err();
    assert!(matches!(err, RepoError::InsufficientStorage { .. }));
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
